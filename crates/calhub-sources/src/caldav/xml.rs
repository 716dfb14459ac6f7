//! Request bodies and multistatus parsing for CalDAV.
//!
//! The request bodies are fixed documents, so they live here as constants.
//! Responses are WebDAV multistatus XML; the parsers below pull out the few
//! elements we care about and ignore namespace prefixes, which vary between
//! servers.

use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;

/// PROPFIND body for discovering calendar collections under a URL.
pub const PROPFIND_CALENDARS_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:displayname/>
    <d:resourcetype/>
  </d:prop>
</d:propfind>"#;

/// REPORT body enumerating every VEVENT in a calendar collection.
///
/// Deliberately carries no time-range filter: the fetched document must be
/// window-independent so one cached copy can serve queries of any length.
pub const CALENDAR_QUERY_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:getetag/>
    <c:calendar-data/>
  </d:prop>
  <c:filter>
    <c:comp-filter name="VCALENDAR">
      <c:comp-filter name="VEVENT"/>
    </c:comp-filter>
  </c:filter>
</c:calendar-query>"#;

/// A calendar collection found by PROPFIND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCalendar {
    /// The collection's href (usually server-relative).
    pub href: String,
    /// Display name, when the server provides one.
    pub display_name: Option<String>,
}

/// Parses a PROPFIND multistatus response into calendar collections.
///
/// Only responses whose resourcetype contains a `calendar` element are
/// kept; plain WebDAV collections and the principal itself are ignored.
pub fn parse_propfind_response(xml: &str) -> Vec<DiscoveredCalendar> {
    let mut calendars = Vec::new();

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut href: Option<String> = None;
    let mut display_name: Option<String> = None;
    let mut is_calendar = false;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) | Ok(XmlEvent::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        href = None;
                        display_name = None;
                        is_calendar = false;
                    }
                    "calendar" => is_calendar = true,
                    local @ ("href" | "displayname") => current = Some(local.to_string()),
                    _ => {}
                }
            }
            Ok(XmlEvent::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if local_name(&name) == "response" && is_calendar {
                    if let Some(href) = href.take() {
                        calendars.push(DiscoveredCalendar {
                            href,
                            display_name: display_name.take(),
                        });
                    }
                }
                current = None;
            }
            Ok(XmlEvent::Text(e)) => {
                if let Some(ref element) = current {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match element.as_str() {
                        "href" => href = Some(text),
                        "displayname" => display_name = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    calendars
}

/// Parses a calendar-query REPORT response into `(href, ics)` pairs.
pub fn parse_report_response(xml: &str) -> Vec<(String, String)> {
    let mut objects = Vec::new();

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut href: Option<String> = None;
    let mut data: Option<String> = None;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        href = None;
                        data = None;
                    }
                    local @ ("href" | "calendar-data") => current = Some(local.to_string()),
                    _ => {}
                }
            }
            Ok(XmlEvent::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if local_name(&name) == "response" {
                    if let (Some(href), Some(data)) = (href.take(), data.take()) {
                        objects.push((href, data));
                    }
                }
                current = None;
            }
            Ok(XmlEvent::Text(e)) => {
                if let Some(ref element) = current {
                    let text = e.unescape().unwrap_or_default().to_string();
                    assign(element, text, &mut href, &mut data);
                }
            }
            Ok(XmlEvent::CData(e)) => {
                if let Some(ref element) = current {
                    let text = String::from_utf8_lossy(&e).to_string();
                    assign(element, text, &mut href, &mut data);
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    objects
}

fn assign(element: &str, text: String, href: &mut Option<String>, data: &mut Option<String>) {
    match element {
        "href" => *href = Some(text),
        "calendar-data" => *data = Some(text),
        _ => {}
    }
}

/// Strips a namespace prefix from an element name.
fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
