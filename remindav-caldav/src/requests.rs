//! Custom CalDAV requests for calendar discovery and time-range queries.
//!
//! libdav 0.10 ships no PROPFIND calendar listing and no time-range
//! filtered calendar-query, so both are implemented as [`DavRequest`]s
//! with roxmltree multistatus parsing.

use http::Method;
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};

// ============================================================================
// Calendar collection listing (PROPFIND on the calendar home)
// ============================================================================

/// Depth-1 PROPFIND on the calendar-home-set, asking for display name and
/// resource type of every child collection.
pub struct ListCalendarCollections<'a> {
    home_href: &'a str,
}

impl<'a> ListCalendarCollections<'a> {
    pub fn new(home_href: &'a str) -> Self {
        Self { home_href }
    }
}

/// One child collection of the calendar home that is a calendar.
#[derive(Debug)]
pub struct CalendarCollection {
    pub href: String,
    pub display_name: Option<String>,
}

/// Response from a [`ListCalendarCollections`] request.
#[derive(Debug)]
pub struct ListCalendarCollectionsResponse {
    pub collections: Vec<CalendarCollection>,
}

impl DavRequest for ListCalendarCollections<'_> {
    type Response = ListCalendarCollectionsResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> Result<PreparedRequest, http::Error> {
        let body = r#"<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
    <d:prop>
        <d:displayname/>
        <d:resourcetype/>
    </d:prop>
</d:propfind>"#
            .to_string();

        Ok(PreparedRequest {
            method: Method::from_bytes(b"PROPFIND")?,
            path: self.home_href.to_string(),
            body,
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let collections = parse_collections(body)?;
        Ok(ListCalendarCollectionsResponse { collections })
    }
}

/// Parse calendar collections from a PROPFIND multistatus response.
///
/// A collection counts as a calendar iff its `resourcetype` contains a
/// caldav `calendar` element; the home collection itself does not.
fn parse_collections(body: &[u8]) -> Result<Vec<CalendarCollection>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    let mut collections = Vec::new();

    for response in root.descendants().filter(|n| n.tag_name().name() == "response") {
        let href = response
            .descendants()
            .find(|n| n.tag_name().name() == "href")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        let Some(href) = href else { continue };

        let is_calendar = response
            .descendants()
            .filter(|n| n.tag_name().name() == "resourcetype")
            .any(|rt| rt.children().any(|c| c.tag_name().name() == "calendar"));

        if !is_calendar {
            continue;
        }

        let display_name = response
            .descendants()
            .find(|n| n.tag_name().name() == "displayname")
            .and_then(|n| n.text())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        collections.push(CalendarCollection { href, display_name });
    }

    Ok(collections)
}

// ============================================================================
// Time-range filtered calendar query (REPORT on one calendar)
// ============================================================================

/// calendar-query REPORT with a server-side VEVENT time-range filter.
///
/// `start` and `end` must be in CalDAV format: `YYYYMMDDTHHMMSSZ`.
pub struct CalendarQueryInRange<'a> {
    collection_href: &'a str,
    start: &'a str,
    end: &'a str,
}

impl<'a> CalendarQueryInRange<'a> {
    pub fn new(collection_href: &'a str, start: &'a str, end: &'a str) -> Self {
        Self {
            collection_href,
            start,
            end,
        }
    }
}

/// A fetched calendar resource with its ICS data.
#[derive(Debug)]
pub struct EventResource {
    pub href: String,
    pub data: String,
}

/// Response from a [`CalendarQueryInRange`] request.
#[derive(Debug)]
pub struct CalendarQueryResponse {
    pub resources: Vec<EventResource>,
}

impl DavRequest for CalendarQueryInRange<'_> {
    type Response = CalendarQueryResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> Result<PreparedRequest, http::Error> {
        let body = format!(
            r#"<C:calendar-query xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <C:calendar-data/>
    </prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT">
                <C:time-range start="{}" end="{}"/>
            </C:comp-filter>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#,
            self.start, self.end
        );

        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.collection_href.to_string(),
            body,
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let resources = parse_event_resources(body)?;
        Ok(CalendarQueryResponse { resources })
    }
}

/// Parse calendar resources from a REPORT multistatus response. Responses
/// without calendar-data are skipped.
fn parse_event_resources(body: &[u8]) -> Result<Vec<EventResource>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    let mut resources = Vec::new();

    for response in root.descendants().filter(|n| n.tag_name().name() == "response") {
        let href = response
            .descendants()
            .find(|n| n.tag_name().name() == "href")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        let Some(href) = href else { continue };

        let data = response
            .descendants()
            .find(|n| n.tag_name().name() == "calendar-data")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        if let Some(data) = data {
            resources.push(EventResource { href, data });
        }
    }

    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propfind_request_shape() {
        let req = ListCalendarCollections::new("/123/calendars/");
        let prepared = req.prepare_request().unwrap();

        assert_eq!(prepared.method, Method::from_bytes(b"PROPFIND").unwrap());
        assert_eq!(prepared.path, "/123/calendars/");
        assert_eq!(
            prepared.headers,
            vec![("Depth".to_string(), "1".to_string())]
        );
        assert!(prepared.body.contains("<d:resourcetype/>"));
    }

    #[test]
    fn report_request_carries_time_range() {
        let req = CalendarQueryInRange::new("/123/calendars/work/", "20250101T000000Z", "20250106T000000Z");
        let prepared = req.prepare_request().unwrap();

        assert_eq!(prepared.method, Method::from_bytes(b"REPORT").unwrap());
        assert_eq!(prepared.path, "/123/calendars/work/");
        assert!(prepared
            .body
            .contains(r#"<C:time-range start="20250101T000000Z" end="20250106T000000Z"/>"#));
    }

    #[test]
    fn parses_calendar_collections_and_skips_the_home() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/123/calendars/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/></d:resourcetype>
      </d:prop>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/123/calendars/work/</d:href>
    <d:propstat>
      <d:prop>
        <d:displayname>Work</d:displayname>
        <d:resourcetype><d:collection/><cal:calendar/></d:resourcetype>
      </d:prop>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/123/calendars/private/</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype><d:collection/><cal:calendar/></d:resourcetype>
      </d:prop>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

        let collections = parse_collections(xml.as_bytes()).unwrap();

        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].href, "/123/calendars/work/");
        assert_eq!(collections[0].display_name.as_deref(), Some("Work"));
        assert_eq!(collections[1].href, "/123/calendars/private/");
        assert_eq!(collections[1].display_name, None);
    }

    #[test]
    fn parses_event_resources_with_calendar_data() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/123/calendars/work/abc.ics</d:href>
    <d:propstat>
      <d:prop>
        <cal:calendar-data>BEGIN:VCALENDAR
BEGIN:VEVENT
UID:abc
END:VEVENT
END:VCALENDAR</cal:calendar-data>
      </d:prop>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/123/calendars/work/empty.ics</d:href>
    <d:propstat>
      <d:prop/>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

        let resources = parse_event_resources(xml.as_bytes()).unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].href, "/123/calendars/work/abc.ics");
        assert!(resources[0].data.contains("UID:abc"));
    }
}
