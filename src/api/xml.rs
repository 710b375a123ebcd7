//! S3 XML documents

use chrono::{DateTime, SecondsFormat, Utc};

use crate::listing::BucketListing;

const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const STORAGE_CLASS: &str = "STANDARD";

/// XML-escape a string
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Format a timestamp as ISO 8601 with milliseconds, as S3 does
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Append `<name>value</name>` when a value is present
fn push_element(xml: &mut String, indent: &str, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        xml.push_str(&format!("{}<{}>{}</{}>\n", indent, name, xml_escape(value), name));
    }
}

/// Render a ListObjectsV2 `ListBucketResult` document
pub fn list_bucket_result(listing: &BucketListing) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!("<ListBucketResult xmlns=\"{}\">\n", S3_NAMESPACE));

    push_element(&mut xml, "  ", "Name", Some(listing.name()));
    push_element(&mut xml, "  ", "Prefix", Some(listing.prefix()));
    push_element(&mut xml, "  ", "Delimiter", listing.delimiter());
    push_element(&mut xml, "  ", "MaxKeys", Some(&listing.max_keys().to_string()));
    push_element(&mut xml, "  ", "IsTruncated", Some(&listing.is_truncated().to_string()));
    push_element(&mut xml, "  ", "KeyCount", Some(&listing.key_count().to_string()));
    push_element(&mut xml, "  ", "ContinuationToken", listing.continuation_token());
    push_element(&mut xml, "  ", "NextContinuationToken", listing.next_continuation_token());
    push_element(&mut xml, "  ", "StartAfter", listing.start_after());

    for object in listing.contents() {
        xml.push_str("  <Contents>\n");
        push_element(&mut xml, "    ", "Key", Some(object.key()));
        push_element(
            &mut xml,
            "    ",
            "LastModified",
            object.modified_at().map(|t| format_time(&t)).as_deref(),
        );
        push_element(
            &mut xml,
            "    ",
            "ETag",
            object.etag().map(|etag| format!("\"{}\"", etag)).as_deref(),
        );
        push_element(
            &mut xml,
            "    ",
            "Size",
            object.size().map(|size| size.to_string()).as_deref(),
        );
        push_element(&mut xml, "    ", "StorageClass", Some(STORAGE_CLASS));
        xml.push_str("  </Contents>\n");
    }

    for prefix in listing.common_prefixes() {
        xml.push_str("  <CommonPrefixes>\n");
        push_element(&mut xml, "    ", "Prefix", Some(prefix));
        xml.push_str("  </CommonPrefixes>\n");
    }

    xml.push_str("</ListBucketResult>");
    xml
}

/// Render an S3 `Error` document
pub fn error_document(code: &str, message: &str) -> String {
    format!(
        "{}<Error>\n  <Code>{}</Code>\n  <Message>{}</Message>\n</Error>",
        XML_DECLARATION,
        xml_escape(code),
        xml_escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSnapshot, ObjectMeta, ObjectRecord};
    use crate::listing::{grouped_list, ListingQuery};
    use chrono::TimeZone;

    fn xml_unescape(s: &str) -> String {
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    fn listing(records: Vec<ObjectRecord>, query: &ListingQuery) -> BucketListing {
        let snap = CatalogSnapshot::from_records(records).unwrap();
        grouped_list(&snap, "my-bucket", query).unwrap()
    }

    #[test]
    fn test_xml_escape_all_five() {
        let raw = "a&b<c>d\"e'f";
        let escaped = xml_escape(raw);
        assert_eq!(escaped, "a&amp;b&lt;c&gt;d&quot;e&apos;f");
        assert_eq!(xml_unescape(&escaped), raw);
        // already-escaped text is escaped again, not passed through
        assert_eq!(xml_unescape(&xml_escape("&amp;")), "&amp;");
    }

    #[test]
    fn test_list_bucket_result_layout() {
        let modified = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let record = ObjectRecord::new(
            "logs/app.log",
            ObjectMeta {
                size: Some(1024),
                modified_at: Some(modified),
                etag: Some("abc123".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let sub = ObjectRecord::sized("logs/sub/x.txt", 1).unwrap();

        let query = ListingQuery {
            prefix: Some("logs/".into()),
            delimiter: Some("/".into()),
            ..Default::default()
        };
        let xml = list_bucket_result(&listing(vec![record, sub], &query));

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(xml.contains(
            "<ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">"
        ));
        assert!(xml.contains("<Name>my-bucket</Name>"));
        assert!(xml.contains("<Prefix>logs/</Prefix>"));
        assert!(xml.contains("<Delimiter>/</Delimiter>"));
        assert!(xml.contains("<MaxKeys>1000</MaxKeys>"));
        assert!(xml.contains("<IsTruncated>false</IsTruncated>"));
        assert!(xml.contains("<KeyCount>2</KeyCount>"));
        assert!(xml.contains("<Key>logs/app.log</Key>"));
        assert!(xml.contains("<LastModified>2025-01-02T03:04:05.000Z</LastModified>"));
        assert!(xml.contains("<ETag>&quot;abc123&quot;</ETag>"));
        assert!(xml.contains("<Size>1024</Size>"));
        assert!(xml.contains("<StorageClass>STANDARD</StorageClass>"));
        assert!(xml.contains("<CommonPrefixes>\n    <Prefix>logs/sub/</Prefix>\n  </CommonPrefixes>"));
        assert!(!xml.contains("NextContinuationToken"));
        assert!(!xml.contains("StartAfter"));
        assert!(xml.ends_with("</ListBucketResult>"));
    }

    #[test]
    fn test_empty_prefix_is_rendered() {
        let xml = list_bucket_result(&listing(Vec::new(), &ListingQuery::default()));
        assert!(xml.contains("<Prefix></Prefix>"));
        assert!(xml.contains("<KeyCount>0</KeyCount>"));
        assert!(!xml.contains("<Delimiter>"));
        assert!(!xml.contains("<Contents>"));
    }

    #[test]
    fn test_special_characters_roundtrip() {
        let key = "we&ird/<key> \"quoted\" 'single'";
        let record = ObjectRecord::sized(key, 3).unwrap();
        let xml = list_bucket_result(&listing(vec![record], &ListingQuery::default()));

        let start = xml.find("<Key>").unwrap() + "<Key>".len();
        let end = xml.find("</Key>").unwrap();
        let rendered = &xml[start..end];
        assert!(!rendered.contains('<') && !rendered.contains('"') && !rendered.contains('\''));
        assert_eq!(xml_unescape(rendered), key);
    }

    #[test]
    fn test_error_document() {
        let xml = error_document("InvalidRequest", "list-type <2> & \"more\"");
        assert!(xml.contains("<Code>InvalidRequest</Code>"));
        assert!(xml.contains("<Message>list-type &lt;2&gt; &amp; &quot;more&quot;</Message>"));
    }
}
