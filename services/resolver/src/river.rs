use crate::record::CameraRecord;
use serde::Serialize;
use std::fmt;

/// River basin program operating a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiverType {
    Hangang,
    Nakdong,
    Geum,
    Yeongsan,
}

/// Center-name token for each river, checked in order
const RIVER_TOKENS: &[(&str, RiverType)] = &[
    ("한강", RiverType::Hangang),
    ("낙동강", RiverType::Nakdong),
    ("금강", RiverType::Geum),
    ("영산강", RiverType::Yeongsan),
];

impl RiverType {
    pub const ALL: [RiverType; 4] = [
        RiverType::Hangang,
        RiverType::Nakdong,
        RiverType::Geum,
        RiverType::Yeongsan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiverType::Hangang => "hangang",
            RiverType::Nakdong => "nakdong",
            RiverType::Geum => "geum",
            RiverType::Yeongsan => "yeongsan",
        }
    }

    /// Portal URL template, with `{ID}` and `{PASSWD}` placeholders.
    /// Informational only; see [`RiverType::portal_url`].
    pub fn template(&self) -> &'static str {
        match self {
            RiverType::Hangang => "http://hrfco.go.kr/sumun/cctvPopup.do?Obscd={ID}",
            RiverType::Nakdong => {
                "https://www.nakdongriver.go.kr/sumun/popup/cctvView.do?Obscd={ID}"
            }
            RiverType::Geum => {
                "https://www.geumriver.go.kr/html/sumun/rtmpView.jsp?wlobscd={PASSWD}&cctvcd={ID}"
            }
            RiverType::Yeongsan => {
                "https://www.yeongsanriver.go.kr/sumun/videoDetail.do?wlobscd={PASSWD}"
            }
        }
    }

    /// Build the portal URL for a record.
    ///
    /// Missing fields become empty values; the parameters are always present
    /// and nothing is percent-encoded.
    pub fn portal_url(&self, record: &CameraRecord) -> String {
        let id = record.internal_id.as_deref().unwrap_or("");
        let passwd = record.credential.as_deref().unwrap_or("");

        match self {
            RiverType::Hangang => format!("http://hrfco.go.kr/sumun/cctvPopup.do?Obscd={id}"),
            RiverType::Nakdong => {
                format!("https://www.nakdongriver.go.kr/sumun/popup/cctvView.do?Obscd={id}")
            }
            RiverType::Geum => format!(
                "https://www.geumriver.go.kr/html/sumun/rtmpView.jsp?wlobscd={passwd}&cctvcd={id}"
            ),
            RiverType::Yeongsan => {
                format!("https://www.yeongsanriver.go.kr/sumun/videoDetail.do?wlobscd={passwd}")
            }
        }
    }
}

impl fmt::Display for RiverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect whether a record belongs to a river authority.
pub fn detect_river(record: &CameraRecord) -> Option<RiverType> {
    let center = record.center.as_deref()?;

    RIVER_TOKENS
        .iter()
        .find(|(token, _)| center.contains(token))
        .map(|(_, river)| *river)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(center: Option<&str>, id: Option<&str>, passwd: Option<&str>) -> CameraRecord {
        CameraRecord {
            center: center.map(str::to_string),
            internal_id: id.map(str::to_string),
            credential: passwd.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_detects_each_river_by_substring() {
        let cases = [
            ("한강홍수통제소", RiverType::Hangang),
            ("낙동강홍수통제소", RiverType::Nakdong),
            ("금강홍수통제소", RiverType::Geum),
            ("영산강홍수통제소", RiverType::Yeongsan),
        ];

        for (center, expected) in cases {
            assert_eq!(detect_river(&record(Some(center), None, None)), Some(expected));
        }
    }

    #[test]
    fn test_no_center_or_no_token_is_none() {
        assert_eq!(detect_river(&record(None, None, None)), None);
        assert_eq!(detect_river(&record(Some("서울교통정보센터"), None, None)), None);
        assert_eq!(detect_river(&record(Some(""), None, None)), None);
        assert_eq!(detect_river(&record(Some("HANGANG"), None, None)), None);
    }

    #[test]
    fn test_hangang_url_with_and_without_id() {
        let with_id = record(Some("한강홍수통제소"), Some("1018683"), None);
        assert_eq!(
            RiverType::Hangang.portal_url(&with_id),
            "http://hrfco.go.kr/sumun/cctvPopup.do?Obscd=1018683"
        );

        let without_id = record(Some("한강홍수통제소"), None, None);
        assert_eq!(
            RiverType::Hangang.portal_url(&without_id),
            "http://hrfco.go.kr/sumun/cctvPopup.do?Obscd="
        );
    }

    #[test]
    fn test_geum_uses_passwd_then_id() {
        let r = record(Some("금강홍수통제소"), Some("CAM7"), Some("3012680"));
        assert_eq!(
            RiverType::Geum.portal_url(&r),
            "https://www.geumriver.go.kr/html/sumun/rtmpView.jsp?wlobscd=3012680&cctvcd=CAM7"
        );

        let empty = record(Some("금강홍수통제소"), None, None);
        assert_eq!(
            RiverType::Geum.portal_url(&empty),
            "https://www.geumriver.go.kr/html/sumun/rtmpView.jsp?wlobscd=&cctvcd="
        );
    }

    #[test]
    fn test_nakdong_and_yeongsan_urls() {
        let r = record(None, Some("2011"), Some("5004"));
        assert_eq!(
            RiverType::Nakdong.portal_url(&r),
            "https://www.nakdongriver.go.kr/sumun/popup/cctvView.do?Obscd=2011"
        );
        assert_eq!(
            RiverType::Yeongsan.portal_url(&r),
            "https://www.yeongsanriver.go.kr/sumun/videoDetail.do?wlobscd=5004"
        );
    }

    #[test]
    fn test_portal_url_matches_published_template() {
        let r = record(None, Some("ID1"), Some("PW1"));
        for river in RiverType::ALL {
            let expected = river.template().replace("{ID}", "ID1").replace("{PASSWD}", "PW1");
            assert_eq!(river.portal_url(&r), expected, "river {}", river);
        }
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiverType::Yeongsan).unwrap(), "\"yeongsan\"");
    }
}
