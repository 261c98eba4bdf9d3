use chrono::NaiveDateTime;
use sqlx::types::Json;

use crate::db::models::LiveRecord;
use crate::error::{AppError, Result};
use crate::types::LiveItem;

/// `openDate` layout used by the listing API.
pub const OPEN_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `-`, ` ` and `:` positions of the layout; every other byte is a digit.
const OPEN_DATE_SEPARATORS: [(usize, u8); 5] =
    [(4, b'-'), (7, b'-'), (10, b' '), (13, b':'), (16, b':')];

/// Parse `value` only if it is exactly `YYYY-MM-DD HH:MM:SS`. chrono alone
/// accepts single-digit fields and leading whitespace.
pub fn parse_open_date(value: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    if !has_open_date_layout(value) {
        // chrono::ParseError has no public constructor; an empty input yields TooShort.
        return NaiveDateTime::parse_from_str("", OPEN_DATE_FORMAT);
    }
    NaiveDateTime::parse_from_str(value, OPEN_DATE_FORMAT)
}

fn has_open_date_layout(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, &b)| {
            match OPEN_DATE_SEPARATORS.iter().find(|(pos, _)| *pos == i) {
                Some(&(_, sep)) => b == sep,
                None => b.is_ascii_digit(),
            }
        })
}

/// Convert every item or none. The first unparsable `openDate` fails the
/// whole listing and names the offending index and liveId.
pub fn convert_listing(items: &[LiveItem]) -> Result<Vec<LiveRecord>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            to_record(item).map_err(|source| AppError::Conversion {
                index,
                live_id: item.live_id,
                value: item.open_date.clone(),
                source,
            })
        })
        .collect()
}

fn to_record(item: &LiveItem) -> std::result::Result<LiveRecord, chrono::ParseError> {
    Ok(LiveRecord {
        live_id: item.live_id,
        live_title: item.live_title.clone(),
        live_thumbnail_image_url: item.live_thumbnail_image_url.clone(),
        concurrent_user_count: item.concurrent_user_count,
        open_date: parse_open_date(&item.open_date)?,
        adult: item.adult,
        tags: Json(item.tags.clone()),
        category_type: item.category_type.clone(),
        live_category: item.live_category.clone(),
        live_category_value: item.live_category_value.clone(),
        channel_id: item.channel_id.clone(),
        channel_name: item.channel_name.clone(),
        channel_image_url: item.channel_image_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    use crate::types::fixtures::live_item;

    #[test]
    fn open_date_is_parsed_field_by_field() {
        let mut item = live_item(7);
        item.open_date = "2024-01-15 10:30:00".to_string();

        let records = convert_listing(&[item]).expect("convert");
        let at = records[0].open_date;
        assert_eq!((at.year(), at.month(), at.day()), (2024, 1, 15));
        assert_eq!((at.hour(), at.minute(), at.second()), (10, 30, 0));
    }

    #[test]
    fn other_fields_are_copied_verbatim() {
        let mut item = live_item(3);
        item.live_title = "  padded title  ".to_string();
        item.channel_name = String::new();
        item.tags = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        item.adult = true;

        let record = convert_listing(&[item.clone()]).expect("convert").remove(0);
        assert_eq!(record.live_id, 3);
        assert_eq!(record.live_title, "  padded title  ");
        assert_eq!(record.channel_name, "");
        assert_eq!(record.tags.0, item.tags);
        assert!(record.adult);
        assert_eq!(record.concurrent_user_count, item.concurrent_user_count);
        assert_eq!(record.live_thumbnail_image_url, item.live_thumbnail_image_url);
    }

    #[test]
    fn order_and_cardinality_are_preserved() {
        let items: Vec<_> = [5, 1, 9, 2].into_iter().map(live_item).collect();
        let records = convert_listing(&items).expect("convert");
        let ids: Vec<i64> = records.iter().map(|r| r.live_id).collect();
        assert_eq!(ids, vec![5, 1, 9, 2]);
    }

    #[test]
    fn malformed_date_fails_the_whole_listing() {
        let mut items: Vec<_> = (1..=4).map(live_item).collect();
        items[2].open_date = "not-a-date".to_string();

        let err = convert_listing(&items).unwrap_err();
        match &err {
            AppError::Conversion { index, live_id, value, .. } => {
                assert_eq!(*index, 2);
                assert_eq!(*live_id, 3);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected Conversion, got {other}"),
        }
        assert_eq!(err.stage(), "convert");
    }

    #[test]
    fn iso_style_dates_are_rejected() {
        assert!(parse_open_date("2024-01-15T10:30:00").is_err());
        assert!(parse_open_date("2024-01-15").is_err());
        assert!(parse_open_date("2024-02-30 10:30:00").is_err());
    }

    #[test]
    fn loose_layouts_are_rejected() {
        assert!(parse_open_date("2024-1-5 1:3:0").is_err());
        assert!(parse_open_date(" 2024-01-15 10:30:00").is_err());
        assert!(parse_open_date("2024-01-15 10:30:00 ").is_err());
        assert!(parse_open_date("2024-01-15  10:30:0").is_err());
        assert!(parse_open_date("2024/01/15 10:30:00").is_err());
        assert!(parse_open_date("").is_err());
        assert!(parse_open_date("2024-01-15 10:30:00").is_ok());
    }

    #[test]
    fn single_digit_fields_fail_the_listing() {
        let mut items: Vec<_> = (1..=2).map(live_item).collect();
        items[1].open_date = "2024-1-5 1:3:0".to_string();

        let err = convert_listing(&items).unwrap_err();
        assert!(matches!(err, AppError::Conversion { index: 1, live_id: 2, .. }), "{err}");
    }

    #[test]
    fn empty_listing_converts_to_nothing() {
        assert!(convert_listing(&[]).expect("convert").is_empty());
    }
}
