use crate::error::IndexError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One stored file as reported by the index API.
///
/// Records are keyed by `cid` and never mutated after they arrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub cid: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub file_size: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub replicas: u64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub block_timestamp: i64,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub memo: Option<String>,
}

/// A single page of the listing, consumed immediately by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub files: Vec<FileRecord>,
    pub total_count: u64,
    pub has_more: bool,
}

/// Envelope returned by `POST /api/scan/swork/member/orders`.
///
/// `code` is 0 on success. Failures come back as a non-zero code with
/// `data: null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<IndexData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexData {
    #[serde(default)]
    pub list: Option<Vec<FileRecord>>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub count: u64,
}

impl TryFrom<IndexResponse> for ListingPage {
    type Error = IndexError;

    fn try_from(resp: IndexResponse) -> Result<Self, Self::Error> {
        let data = match resp.data {
            Some(data) if resp.code == 0 => data,
            _ => {
                return Err(IndexError::Api {
                    code: resp.code,
                    message: resp.message,
                })
            }
        };
        let files = data.list.unwrap_or_default();
        // An absent or empty list is the end-of-results signal; an absent
        // `data` object is not.
        let has_more = !files.is_empty();
        Ok(Self {
            files,
            total_count: data.count,
            has_more,
        })
    }
}

// The index has been seen returning sizes and timestamps both as JSON numbers
// and as decimal strings.
fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    })
}

fn non_empty_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<String>::deserialize(d)?;
    Ok(v.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_numbers_and_strings() {
        let r: FileRecord = serde_json::from_value(serde_json::json!({
            "cid": "QmA",
            "file_size": "2048",
            "replicas": 7,
            "block_timestamp": 1700000000,
            "memo": ""
        }))
        .unwrap();
        assert_eq!(r.file_size, 2048);
        assert_eq!(r.replicas, 7);
        assert_eq!(r.block_timestamp, 1_700_000_000);
        assert_eq!(r.memo, None);
    }

    #[test]
    fn record_missing_optional_fields() {
        let r: FileRecord = serde_json::from_str(r#"{"cid":"QmB"}"#).unwrap();
        assert_eq!(r.file_size, 0);
        assert_eq!(r.memo, None);
    }

    #[test]
    fn null_list_means_no_more() {
        let resp: IndexResponse =
            serde_json::from_str(r#"{"data":{"list":null,"count":12}}"#).unwrap();
        let page = ListingPage::try_from(resp).unwrap();
        assert!(page.files.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.total_count, 12);
    }

    #[test]
    fn populated_list_has_more() {
        let resp: IndexResponse = serde_json::from_str(
            r#"{"data":{"list":[{"cid":"QmC","file_size":1,"replicas":2,"block_timestamp":3}],"count":1}}"#,
        )
        .unwrap();
        let page = ListingPage::try_from(resp).unwrap();
        assert_eq!(page.files.len(), 1);
        assert!(page.has_more);
    }

    #[test]
    fn null_data_is_an_error() {
        let resp: IndexResponse =
            serde_json::from_str(r#"{"code":10001,"message":"Invalid","data":null}"#).unwrap();
        assert_eq!(
            ListingPage::try_from(resp),
            Err(IndexError::Api {
                code: 10001,
                message: "Invalid".into()
            })
        );

        let resp: IndexResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(ListingPage::try_from(resp), Err(IndexError::Api { code: 0, .. })));
    }

    #[test]
    fn error_code_with_data_is_an_error() {
        let resp: IndexResponse = serde_json::from_str(
            r#"{"code":429,"message":"rate limited","data":{"list":[],"count":0}}"#,
        )
        .unwrap();
        assert!(ListingPage::try_from(resp).is_err());
    }
}
