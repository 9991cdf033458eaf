//! Scimago Journal Rank client.
//!
//! The quartile of a journal can be obtained in two ways:
//!
//! - [`ScimagoPlatform::download_quartile`] fetches the small indicator
//!   picture displayed by the website for one journal and reads the quartile
//!   from the color of a fixed pixel;
//! - [`ScimagoPlatform::journal_ranking`] downloads the yearly ranking table
//!   (a semicolon-separated CSV file) with the quartile of every journal in
//!   each of its categories.
//!
//! Tables are cached per year for the lifetime of the platform.

use async_trait::async_trait;
use image::GenericImageView;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

use super::csv_table::{self, field, find_column};
use super::{JournalQuartiles, RankingError};
use crate::config::ScimagoConfig;
use crate::models::QuartileRanking;
use crate::utils::HttpClient;

/// Default address of the Scimago website
pub const SCIMAGO_BASE_URL: &str = "https://www.scimagojr.com/";

const RANK_PATH: &str = "journalrank.php";
const JOURNAL_PATH: &str = "journalsearch.php";
const JOURNAL_PICTURE_PATH: &str = "journal_img.php";

const SOURCE_ID_COLUMN_NAME: &str = "Sourceid";
const SOURCE_ID_COLUMN_INDEX: usize = 1;
const CATEGORY_COLUMN_NAME: &str = "Categories";
const CATEGORY_COLUMN_INDEX: usize = 22;
const BEST_QUARTILE_COLUMN_NAME: &str = "SJR Best Quartile";
const BEST_QUARTILE_COLUMN_INDEX: usize = 6;

/// Pixel of the journal picture whose color gives the quartile
const QUARTILE_PIXEL: (u32, u32) = (5, 55);

static CATEGORY_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[,;]\s*").expect("Invalid category separator regex"));

static CATEGORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.+?)\s*\(([^)]+)\)\s*$").expect("Invalid category regex")
});

/// Quartile encoded by the red channel of the journal picture
pub fn quartile_from_red(red: u8) -> Option<QuartileRanking> {
    match red {
        164 => Some(QuartileRanking::Q1),
        232 => Some(QuartileRanking::Q2),
        251 => Some(QuartileRanking::Q3),
        221 => Some(QuartileRanking::Q4),
        _ => None,
    }
}

/// Decode a journal picture and classify its quartile pixel
pub fn quartile_from_image(bytes: &[u8]) -> Result<Option<QuartileRanking>, RankingError> {
    let picture = image::load_from_memory(bytes)?;
    let (x, y) = QUARTILE_PIXEL;
    let (width, height) = picture.dimensions();
    if x >= width || y >= height {
        return Err(RankingError::Image(format!(
            "picture of {}x{} has no pixel ({}, {})",
            width, height, x, y
        )));
    }
    let red = picture.get_pixel(x, y).0[0];
    Ok(quartile_from_red(red))
}

/// Split a "Categories" cell such as `Computer Science (Q1); Robotics (Q2)`
/// into category names and quartiles.
///
/// Entries without a recognizable quartile are ignored.
pub fn parse_categories(raw: &str) -> Vec<(String, QuartileRanking)> {
    CATEGORY_SEPARATOR
        .split(raw)
        .filter_map(|entry| {
            let captures = CATEGORY_PATTERN.captures(entry)?;
            let name = captures.get(1)?.as_str();
            let quartile = captures.get(2)?.as_str().parse::<QuartileRanking>().ok()?;
            (!name.is_empty()).then(|| (name.to_string(), quartile))
        })
        .collect()
}

/// Quartiles of every journal of a yearly Scimago table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScimagoRanking {
    journals: BTreeMap<String, JournalQuartiles>,
}

impl ScimagoRanking {
    /// Quartiles of the journal with the given Scimago identifier
    pub fn get(&self, journal_id: &str) -> Option<&JournalQuartiles> {
        self.journals.get(journal_id.trim())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JournalQuartiles)> {
        self.journals.iter().map(|(id, quartiles)| (id.as_str(), quartiles))
    }

    pub fn len(&self) -> usize {
        self.journals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journals.is_empty()
    }
}

/// Read a Scimago CSV table.
///
/// Columns are located from the header row when `search_columns_by_name` is
/// set, otherwise at the positions used by the Scimago export.
pub fn read_journal_ranking<R: Read>(
    input: R,
    search_columns_by_name: bool,
) -> Result<ScimagoRanking, RankingError> {
    let mut reader = csv_table::reader(input);
    let mut records = csv_table::records(&mut reader);

    let missing_source_id = || {
        RankingError::Format(format!(
            "unable to find the column \"{}\" (index: {})",
            SOURCE_ID_COLUMN_NAME, SOURCE_ID_COLUMN_INDEX
        ))
    };

    let headers = match records.next() {
        Some(headers) => headers?,
        None => return Err(missing_source_id()),
    };

    let (source_id_column, category_column, best_quartile_column) = if search_columns_by_name {
        (
            find_column(&headers, SOURCE_ID_COLUMN_NAME),
            find_column(&headers, CATEGORY_COLUMN_NAME),
            find_column(&headers, BEST_QUARTILE_COLUMN_NAME),
        )
    } else {
        (
            Some(SOURCE_ID_COLUMN_INDEX),
            Some(CATEGORY_COLUMN_INDEX),
            Some(BEST_QUARTILE_COLUMN_INDEX),
        )
    };
    let source_id_column = source_id_column.ok_or_else(missing_source_id)?;
    if category_column.is_none() && best_quartile_column.is_none() {
        return Err(RankingError::Format(
            "no column for quartiles in the Scimago table".to_string(),
        ));
    }

    let mut journals = BTreeMap::new();
    for record in records {
        let record = record?;
        let mut quartiles = JournalQuartiles::new();
        if let Some(raw) = field(&record, category_column) {
            for (name, quartile) in parse_categories(raw) {
                quartiles.insert(&name, quartile);
            }
        }
        if let Some(quartile) = field(&record, best_quartile_column)
            .and_then(|raw| raw.parse::<QuartileRanking>().ok())
        {
            quartiles.set_best(quartile);
        }
        if quartiles.is_empty() {
            continue;
        }
        if let Some(journal_id) = field(&record, Some(source_id_column)) {
            journals.insert(journal_id.to_string(), quartiles);
        }
    }

    tracing::debug!(journals = journals.len(), "Read Scimago ranking table");
    Ok(ScimagoRanking { journals })
}

/// Access to the rankings published by Scimago
#[async_trait]
pub trait ScimagoPlatform: Send + Sync {
    /// Address of the quartile picture of a journal
    fn journal_picture_url(&self, journal_id: &str) -> Option<Url>;

    /// Address of the page of a journal
    fn journal_url(&self, journal_id: &str) -> Option<Url>;

    /// Address of the ranking table of a year
    fn journal_csv_url(&self, year: i32) -> Result<Url, RankingError>;

    /// Quartile read from the journal picture; failures are logged and give
    /// `None`
    async fn download_quartile(&self, journal_id: &str) -> Option<QuartileRanking>;

    /// Ranking table of the given year
    async fn journal_ranking(&self, year: i32) -> Result<Arc<ScimagoRanking>, RankingError>;

    /// Quartiles of one journal for the given year
    async fn journal_quartiles(
        &self,
        year: i32,
        journal_id: &str,
    ) -> Result<Option<JournalQuartiles>, RankingError> {
        let ranking = self.journal_ranking(year).await?;
        Ok(ranking.get(journal_id).cloned())
    }
}

type RankingCell = Arc<OnceCell<Arc<ScimagoRanking>>>;

/// [`ScimagoPlatform`] querying the Scimago website
#[derive(Debug)]
pub struct OnlineScimagoPlatform {
    http: HttpClient,
    base_url: Url,
    search_columns_by_name: bool,
    rankings: Mutex<HashMap<i32, RankingCell>>,
}

impl OnlineScimagoPlatform {
    /// Create a platform from the configuration
    pub fn new(config: &ScimagoConfig) -> Result<Self, RankingError> {
        let http = HttpClient::new(Duration::from_secs(config.timeout_seconds))?;
        Self::with_client(http, &config.base_url, config.search_columns_by_name)
    }

    /// Create a platform using an existing client
    pub fn with_client(
        http: HttpClient,
        base_url: &str,
        search_columns_by_name: bool,
    ) -> Result<Self, RankingError> {
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };
        Ok(Self {
            http,
            base_url,
            search_columns_by_name,
            rankings: Mutex::new(HashMap::new()),
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, RankingError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<Vec<u8>, RankingError> {
        tracing::debug!(url = %url, "Fetching from Scimago");
        let response = self.http.client().get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RankingError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_quartile(&self, journal_id: &str) -> Result<Option<QuartileRanking>, RankingError> {
        let Some(url) = self.journal_picture_url(journal_id) else {
            return Ok(None);
        };
        let bytes = self.fetch(url).await?;
        quartile_from_image(&bytes)
    }

    async fn fetch_ranking(&self, year: i32) -> Result<Arc<ScimagoRanking>, RankingError> {
        tracing::info!(year, "Downloading the Scimago ranking table");
        let bytes = self.fetch(self.journal_csv_url(year)?).await?;
        let ranking = read_journal_ranking(bytes.as_slice(), self.search_columns_by_name)?;
        Ok(Arc::new(ranking))
    }
}

#[async_trait]
impl ScimagoPlatform for OnlineScimagoPlatform {
    fn journal_picture_url(&self, journal_id: &str) -> Option<Url> {
        let journal_id = journal_id.trim();
        if journal_id.is_empty() {
            return None;
        }
        self.endpoint(JOURNAL_PICTURE_PATH, &[("id", journal_id)]).ok()
    }

    fn journal_url(&self, journal_id: &str) -> Option<Url> {
        let journal_id = journal_id.trim();
        if journal_id.is_empty() {
            return None;
        }
        self.endpoint(JOURNAL_PATH, &[("tip", "sid"), ("q", journal_id)])
            .ok()
    }

    fn journal_csv_url(&self, year: i32) -> Result<Url, RankingError> {
        let year = year.to_string();
        self.endpoint(RANK_PATH, &[("out", "xls"), ("year", year.as_str())])
    }

    async fn download_quartile(&self, journal_id: &str) -> Option<QuartileRanking> {
        match self.fetch_quartile(journal_id).await {
            Ok(quartile) => quartile,
            Err(e) => {
                tracing::warn!(journal = journal_id, "Cannot read the Scimago quartile: {}", e);
                None
            }
        }
    }

    async fn journal_ranking(&self, year: i32) -> Result<Arc<ScimagoRanking>, RankingError> {
        let cell = self
            .rankings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(year)
            .or_default()
            .clone();
        let ranking = cell.get_or_try_init(|| self.fetch_ranking(year)).await?;
        Ok(ranking.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TABLE: &str = "\u{feff}Rank;Sourceid;Title;Type;Issn;SJR;SJR Best Quartile;Categories\n\
        1;28773;\"Ca-A Cancer Journal for Clinicians\";journal;\"15424863, 00079235\";86,091;Q1;\"Hematology (Q1); Oncology (Q1)\"\n\
        2;21100;\"Robotics Review\";journal;12345678;1,2;Q2;\"Artificial Intelligence (Q2); Control and Systems Engineering (Q3)\"\n\
        3;99999;\"Unranked\";journal;87654321;0;-;\n";

    fn picture(red: u8) -> Vec<u8> {
        let mut picture = image::RgbaImage::new(20, 70);
        picture.put_pixel(5, 55, image::Rgba([red, 10, 10, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(picture)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    fn platform(base_url: &str) -> OnlineScimagoPlatform {
        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        OnlineScimagoPlatform::with_client(http, base_url, true).unwrap()
    }

    #[test]
    fn test_quartile_from_red() {
        assert_eq!(quartile_from_red(164), Some(QuartileRanking::Q1));
        assert_eq!(quartile_from_red(232), Some(QuartileRanking::Q2));
        assert_eq!(quartile_from_red(251), Some(QuartileRanking::Q3));
        assert_eq!(quartile_from_red(221), Some(QuartileRanking::Q4));
        assert_eq!(quartile_from_red(0), None);
        assert_eq!(quartile_from_red(165), None);
    }

    #[test]
    fn test_quartile_from_image() {
        assert_eq!(quartile_from_image(&picture(251)).unwrap(), Some(QuartileRanking::Q3));
        assert_eq!(quartile_from_image(&picture(12)).unwrap(), None);
        assert!(matches!(
            quartile_from_image(b"not a picture"),
            Err(RankingError::Image(_))
        ));
    }

    #[test]
    fn test_parse_categories() {
        assert_eq!(
            parse_categories("Computer Science (miscellaneous) (Q1), Robotics (q2); Bad; Other (Q9)"),
            vec![
                ("Computer Science (miscellaneous)".to_string(), QuartileRanking::Q1),
                ("Robotics".to_string(), QuartileRanking::Q2),
            ]
        );
        assert!(parse_categories("").is_empty());
    }

    #[test]
    fn test_read_by_name() {
        let ranking = read_journal_ranking(TABLE.as_bytes(), true).unwrap();
        assert_eq!(ranking.len(), 2);

        let journal = ranking.get("21100").unwrap();
        assert_eq!(journal.get("artificial intelligence"), Some(QuartileRanking::Q2));
        assert_eq!(journal.get("Control and Systems Engineering"), Some(QuartileRanking::Q3));
        assert_eq!(journal.best(), Some(QuartileRanking::Q2));
        assert!(ranking.get("99999").is_none());
    }

    #[test]
    fn test_read_latin1_title() {
        let mut table = TABLE.as_bytes().to_vec();
        table.extend_from_slice(b"4;31000;\"Rob\xf3tica\";journal;11112222;0,5;Q4;\"Robotics (Q4)\"\n");

        let ranking = read_journal_ranking(table.as_slice(), true).unwrap();
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking.get("31000").unwrap().best(), Some(QuartileRanking::Q4));
        assert_eq!(ranking.get("21100").unwrap().best(), Some(QuartileRanking::Q2));
    }

    #[test]
    fn test_read_by_index() {
        let mut header = vec!["h"; 23];
        header[1] = "id";
        let mut row = vec![""; 23];
        row[1] = "42";
        row[6] = "Q3";
        row[22] = "Optics (Q4)";
        let table = format!("{}\n{}\n", header.join(";"), row.join(";"));

        let ranking = read_journal_ranking(table.as_bytes(), false).unwrap();
        let journal = ranking.get("42").unwrap();
        assert_eq!(journal.best(), Some(QuartileRanking::Q3));
        assert_eq!(journal.get("optics"), Some(QuartileRanking::Q4));
    }

    #[test]
    fn test_invalid_tables() {
        assert!(matches!(
            read_journal_ranking("".as_bytes(), true),
            Err(RankingError::Format(_))
        ));
        assert!(matches!(
            read_journal_ranking("Rank;Title\n1;A\n".as_bytes(), true),
            Err(RankingError::Format(_))
        ));
        assert!(matches!(
            read_journal_ranking("Rank;Sourceid;Title\n1;2;A\n".as_bytes(), true),
            Err(RankingError::Format(_))
        ));
    }

    #[test]
    fn test_urls() {
        let platform = platform(SCIMAGO_BASE_URL);
        assert_eq!(
            platform.journal_picture_url("21100").unwrap().as_str(),
            "https://www.scimagojr.com/journal_img.php?id=21100"
        );
        assert_eq!(
            platform.journal_url("21100").unwrap().as_str(),
            "https://www.scimagojr.com/journalsearch.php?tip=sid&q=21100"
        );
        assert_eq!(
            platform.journal_csv_url(2022).unwrap().as_str(),
            "https://www.scimagojr.com/journalrank.php?out=xls&year=2022"
        );
        assert!(platform.journal_picture_url(" ").is_none());
        assert!(platform.journal_url("").is_none());
    }

    #[tokio::test]
    async fn test_download_quartile() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/journal_img.php")
            .match_query(mockito::Matcher::UrlEncoded("id".into(), "21100".into()))
            .with_header("content-type", "image/png")
            .with_body(picture(164))
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/journal_img.php")
            .match_query(mockito::Matcher::UrlEncoded("id".into(), "404".into()))
            .with_status(404)
            .create_async()
            .await;

        let platform = platform(&server.url());
        assert_eq!(platform.download_quartile("21100").await, Some(QuartileRanking::Q1));
        assert_eq!(platform.download_quartile("404").await, None);
        assert_eq!(platform.download_quartile("").await, None);
        ok.assert_async().await;
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn test_journal_ranking_cached_per_year() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/journalrank.php")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("out".into(), "xls".into()),
                mockito::Matcher::UrlEncoded("year".into(), "2022".into()),
            ]))
            .with_body(TABLE)
            .expect(1)
            .create_async()
            .await;

        let platform = platform(&server.url());
        let (first, second) = tokio::join!(platform.journal_ranking(2022), platform.journal_ranking(2022));
        let first = first.unwrap();
        assert!(Arc::ptr_eq(&first, &second.unwrap()));
        assert_eq!(
            platform.journal_quartiles(2022, "28773").await.unwrap().unwrap().get("oncology"),
            Some(QuartileRanking::Q1)
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/journalrank.php")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let platform = platform(&server.url());
        assert!(matches!(
            platform.journal_ranking(2021).await,
            Err(RankingError::Status { status: 500, .. })
        ));
        assert!(platform.journal_ranking(2021).await.is_err());
        mock.assert_async().await;
    }
}
