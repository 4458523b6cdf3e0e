//! CalDAV client for the calendar gateway, built on libdav.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use http::Uri;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use libdav::CalDavClient;
use libdav::caldav::FindCalendarHomeSet;
use libdav::dav::WebDavClient;
use tower::ServiceBuilder;
use tower_http::{auth::AddAuthorization, follow_redirect::FollowRedirect};
use tracing::{debug, warn};

use remindav_core::error::{RemindError, RemindResult};
use remindav_core::event::Event;
use remindav_core::gateway::{Calendar, CalendarGateway};
use remindav_core::ics::parse_events;

use crate::requests::{CalendarQueryInRange, ListCalendarCollections};

/// HTTP client with basic auth and redirect following (CalDAV servers
/// commonly redirect to user-specific hosts).
type HttpClient = FollowRedirect<
    AddAuthorization<
        Client<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>, String>,
    >,
>;

type DavClient = CalDavClient<HttpClient>;

/// Calendar gateway talking CalDAV to one server with one account.
pub struct CaldavGateway {
    caldav: DavClient,
    tz: Tz,
    /// Calendar-home-set href, discovered at login.
    home_href: Option<String>,
}

impl CaldavGateway {
    /// Build the client stack for `base_url`. No server communication
    /// happens here; credentials are validated by [`login`].
    ///
    /// [`login`]: CalendarGateway::login
    pub fn connect(base_url: &str, username: &str, password: &str, tz: Tz) -> RemindResult<Self> {
        let caldav = create_caldav_client(base_url, username, password)?;
        Ok(CaldavGateway {
            caldav,
            tz,
            home_href: None,
        })
    }

    /// Expand a server-relative href into an absolute URL on the
    /// (possibly redirected) base.
    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            return href.to_string();
        }

        let base = self.caldav.base_url();
        format!(
            "{}://{}{}",
            base.scheme_str().unwrap_or("https"),
            base.authority().map(|a| a.as_str()).unwrap_or_default(),
            href
        )
    }
}

#[async_trait]
impl CalendarGateway for CaldavGateway {
    async fn login(&mut self) -> RemindResult<()> {
        let principal = self
            .caldav
            .find_current_user_principal()
            .await
            .map_err(|e| RemindError::Gateway(format!("principal lookup failed: {e}")))?
            .ok_or_else(|| {
                RemindError::Auth("server reported no principal; check username and password".into())
            })?;

        let home_set_response = self
            .caldav
            .request(FindCalendarHomeSet::new(&principal))
            .await
            .map_err(|e| RemindError::Gateway(format!("calendar home lookup failed: {e}")))?;

        let calendar_home = home_set_response
            .home_sets
            .into_iter()
            .next()
            .ok_or_else(|| RemindError::Gateway("no calendar home set for this account".into()))?;

        debug!(home = %calendar_home.path(), "calendar home discovered");
        self.home_href = Some(calendar_home.path().to_string());
        Ok(())
    }

    async fn list_calendars(&self) -> RemindResult<Vec<Calendar>> {
        let home_href = self.home_href.as_deref().ok_or(RemindError::NotLoggedIn)?;

        let response = self
            .caldav
            .request(ListCalendarCollections::new(home_href))
            .await
            .map_err(|e| RemindError::Gateway(format!("calendar listing failed: {e}")))?;

        let calendars: Vec<Calendar> = response
            .collections
            .into_iter()
            // The home itself shows up in the Depth-1 listing; skip it.
            .filter(|c| c.href.trim_end_matches('/') != home_href.trim_end_matches('/'))
            .map(|c| {
                let id = collection_id(&c.href);
                let name = c.display_name.unwrap_or_else(|| id.clone());
                Calendar {
                    id,
                    name,
                    url: self.absolute_url(&c.href),
                }
            })
            .collect();

        debug!(count = calendars.len(), "fetched calendar list");
        Ok(calendars)
    }

    async fn search_events(
        &self,
        calendars: &[Calendar],
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> RemindResult<Vec<Event>> {
        if self.home_href.is_none() {
            return Err(RemindError::NotLoggedIn);
        }

        let start_stamp = format_caldav_datetime(start);
        let end_stamp = format_caldav_datetime(end);

        let mut events = Vec::new();
        for calendar in calendars {
            debug!(
                calendar = %calendar.id,
                start = %start_stamp,
                end = %end_stamp,
                "searching events"
            );

            let href = url_to_href(&calendar.url);
            let response = self
                .caldav
                .request(CalendarQueryInRange::new(&href, &start_stamp, &end_stamp))
                .await
                .map_err(|e| {
                    RemindError::Gateway(format!("event query on '{}' failed: {e}", calendar.id))
                })?;

            for resource in response.resources {
                match parse_events(&resource.data, self.tz) {
                    Ok(parsed) => events.extend(parsed),
                    Err(err) => {
                        warn!(href = %resource.href, "skipping unparsable resource: {err}");
                    }
                }
            }
        }

        debug!(count = events.len(), "fetched events");
        Ok(events)
    }
}

/// Create a libdav CalDavClient for the given endpoint.
///
/// The client is configured with basic authentication, automatic redirect
/// following and HTTPS via the platform's native roots.
fn create_caldav_client(base_url: &str, username: &str, password: &str) -> RemindResult<DavClient> {
    let uri: Uri = base_url
        .parse()
        .map_err(|e| RemindError::Config(format!("invalid CalDAV URL '{base_url}': {e}")))?;

    let https_connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| RemindError::Gateway(format!("failed to load native TLS roots: {e}")))?
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
    let auth_client = AddAuthorization::basic(http_client, username, password);
    let client = ServiceBuilder::new()
        .layer(tower_http::follow_redirect::FollowRedirectLayer::new())
        .service(auth_client);

    let webdav = WebDavClient::new(uri, client);
    Ok(CalDavClient::new(webdav))
}

/// Format an instant for a CalDAV time-range filter (`YYYYMMDDTHHMMSSZ`).
fn format_caldav_datetime(dt: DateTime<Tz>) -> String {
    dt.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string()
}

/// Extract the href path from a full URL.
fn url_to_href(url: &str) -> String {
    if let Ok(uri) = url.parse::<Uri>() {
        uri.path().to_string()
    } else {
        url.to_string()
    }
}

/// Collection identifier: the last non-empty path segment of an href.
fn collection_id(href: &str) -> String {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(href)
        .to_string()
}
