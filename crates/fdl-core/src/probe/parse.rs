//! Parse HTTP response header lines into the fields the prober needs.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct HeadFields {
    /// Total size in bytes, if `Content-Length` is present and numeric.
    pub(super) content_length: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`.
    pub(super) accept_ranges: bool,
}

pub(super) fn parse_headers(lines: &[String]) -> HeadFields {
    let mut fields = HeadFields::default();

    for line in lines {
        let Some((name, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            fields.content_length = value.parse::<u64>().ok();
        } else if name.eq_ignore_ascii_case("accept-ranges") {
            fields.accept_ranges = value.eq_ignore_ascii_case("bytes");
        }
    }

    fields
}
