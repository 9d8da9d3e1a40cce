//! Server-rendered statistics charts and their cache-busting URLs.

use chrono::Utc;
use shared::protocol::ChartKind;
use url::Url;

/// Hands out `t=` values for chart URLs. Each value is the current time in
/// milliseconds, bumped past the previous one when the clock has not moved on.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: i64,
}

impl CacheBuster {
    pub fn next(&mut self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub fn next_at(&mut self, now_millis: i64) -> i64 {
        let stamp = now_millis.max(self.last.saturating_add(1));
        self.last = stamp;
        stamp
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSource {
    pub kind: ChartKind,
    pub url: Url,
    pub stamp: i64,
}

pub fn chart_url(base: &Url, kind: ChartKind, stamp: i64) -> Result<Url, url::ParseError> {
    let mut url = base.join(kind.path().trim_start_matches('/'))?;
    url.query_pairs_mut().append_pair("t", &stamp.to_string());
    Ok(url)
}

/// The most recent URL each chart image was pointed at; `None` until the
/// chart is first shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartUrls {
    pub registrations: Option<ChartSource>,
    pub event_registrations: Option<ChartSource>,
}

impl ChartUrls {
    pub fn get(&self, kind: ChartKind) -> Option<&ChartSource> {
        match kind {
            ChartKind::Registrations => self.registrations.as_ref(),
            ChartKind::EventRegistrations => self.event_registrations.as_ref(),
        }
    }

    pub fn set(&mut self, source: ChartSource) {
        match source.kind {
            ChartKind::Registrations => self.registrations = Some(source),
            ChartKind::EventRegistrations => self.event_registrations = Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_strictly_increase_even_when_clock_stalls() {
        let mut buster = CacheBuster::default();
        let first = buster.next_at(1_000);
        let second = buster.next_at(1_000);
        let third = buster.next_at(999);
        let fourth = buster.next_at(5_000);
        assert!(first < second && second < third && third < fourth);
        assert_eq!(fourth, 5_000);
    }

    #[test]
    fn consecutive_wall_clock_stamps_increase() {
        let mut buster = CacheBuster::default();
        let mut previous = buster.next();
        for _ in 0..100 {
            let stamp = buster.next();
            assert!(stamp > previous);
            previous = stamp;
        }
    }

    #[test]
    fn chart_url_appends_timestamp_query() {
        let base = Url::parse("http://127.0.0.1:5000/").expect("base");
        let url = chart_url(&base, ChartKind::EventRegistrations, 1234).expect("url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/stats/event_registrations.png?t=1234"
        );
    }

    #[test]
    fn chart_urls_keep_one_source_per_kind() {
        let base = Url::parse("http://localhost/").expect("base");
        let mut urls = ChartUrls::default();
        for (stamp, kind) in [(1, ChartKind::Registrations), (2, ChartKind::Registrations)] {
            urls.set(ChartSource {
                kind,
                url: chart_url(&base, kind, stamp).expect("url"),
                stamp,
            });
        }
        assert_eq!(urls.get(ChartKind::Registrations).map(|s| s.stamp), Some(2));
        assert!(urls.get(ChartKind::EventRegistrations).is_none());
    }
}
