use chrono::{DateTime, Duration, Utc};

/// How long a pending delivery report survives without a terminal event
/// before it is dropped.
const PENDING_RECEIPT_TTL_HOURS: i64 = 48;

/// Everything needed to build a delivery receipt later, captured when a
/// submit_sm arrives with the receipt bit set.  Keyed by message id in the
/// server; removed on terminal event or expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDeliveryReport {
    pub session_id: String,
    pub source: String,
    pub destination: String,
    pub source_ton: u8,
    pub source_npi: u8,
    pub dest_ton: u8,
    pub dest_npi: u8,
    pub submit_time: DateTime<Utc>,
    pub message_text: String,
}

impl PendingDeliveryReport {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.submit_time)
            > Duration::hours(PENDING_RECEIPT_TTL_HOURS)
    }
}

/// Format a delivery receipt per SMPP v3.4 appendix B.  Dates are
/// YYMMDDhhmm; the trailing text field carries at most the first 20
/// characters of the original message.
pub fn format_delivery_receipt(
    message_id: &str,
    submit_time: DateTime<Utc>,
    done_time: DateTime<Utc>,
    delivered: bool,
    text: &str,
) -> String {
    let (dlvrd, stat, err) = if delivered {
        ("001", "DELIVRD", "000")
    } else {
        ("000", "UNDELIV", "001")
    };
    let text: String = text.chars().take(20).collect();
    format!(
        "id:{} sub:001 dlvrd:{} submit date:{} done date:{} \
        stat:{} err:{} text:{}",
        message_id,
        dlvrd,
        submit_time.format("%y%m%d%H%M"),
        done_time.format("%y%m%d%H%M"),
        stat,
        err,
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn delivered_receipt_has_delivrd_stat() {
        let receipt = format_delivery_receipt(
            "ab12cd34ef56ab78",
            dt("2021-06-02 09:05:00"),
            dt("2021-06-02 09:06:00"),
            true,
            "hello world",
        );
        assert_eq!(
            receipt,
            "id:ab12cd34ef56ab78 sub:001 dlvrd:001 \
            submit date:2106020905 done date:2106020906 \
            stat:DELIVRD err:000 text:hello world"
        );
    }

    #[test]
    fn failed_receipt_has_undeliv_stat() {
        let receipt = format_delivery_receipt(
            "ab12cd34ef56ab78",
            dt("2021-06-02 09:05:00"),
            dt("2021-06-02 09:06:00"),
            false,
            "hello",
        );
        assert!(receipt.contains("dlvrd:000"));
        assert!(receipt.contains("stat:UNDELIV"));
        assert!(receipt.contains("err:001"));
    }

    #[test]
    fn receipt_text_is_truncated_to_20_chars() {
        let receipt = format_delivery_receipt(
            "ab12cd34ef56ab78",
            dt("2021-06-02 09:05:00"),
            dt("2021-06-02 09:06:00"),
            true,
            "abcdefghijklmnopqrstuvwxyz",
        );
        assert!(receipt.ends_with("text:abcdefghijklmnopqrst"));
    }

    #[test]
    fn pending_report_expires_after_48_hours() {
        let report = PendingDeliveryReport {
            session_id: String::from("127.0.0.1:9999"),
            source: String::from("111"),
            destination: String::from("222"),
            source_ton: 1,
            source_npi: 1,
            dest_ton: 1,
            dest_npi: 1,
            submit_time: dt("2021-06-02 09:05:00"),
            message_text: String::from("hi"),
        };
        assert!(!report.is_expired(dt("2021-06-03 09:05:00")));
        assert!(report.is_expired(dt("2021-06-04 09:06:00")));
    }
}
