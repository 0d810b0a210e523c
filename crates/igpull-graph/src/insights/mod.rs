//! Account-level insights queries.
//!
//! [`InsightsRequest`] carries the validated query vocabulary,
//! [`build_query`] turns it into flat query parameters, and
//! [`InsightsService`] issues the single GET.

pub mod catalog;
mod response;
mod service;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use response::{
    BreakdownData, BreakdownResult, InsightsResponse, MetricData, TimeSeriesValue, TotalValue,
};
pub use service::{InsightsError, InsightsService};

/// Returned by `FromStr` when a value is outside the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Declares a string-backed enum with `as_str`, `ALL`, `Display` and `FromStr`.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_owned() }),
                }
            }
        }
    };
}

vocabulary! {
    /// A queryable account metric.
    Metric, "metric" {
        AccountsEngaged => "accounts_engaged",
        Comments => "comments",
        Follows => "follows",
        Likes => "likes",
        ProfileViews => "profile_views",
        Reach => "reach",
        Replies => "replies",
        Saved => "saved",
        Shares => "shares",
        TotalInteractions => "total_interactions",
        Views => "views",
        WebsiteClicks => "website_clicks",
        AudienceDemographics => "audience_demographics",
        EngagedAudienceDemographics => "engaged_audience_demographics",
        FollowerDemographics => "follower_demographics",
        OnlineFollowers => "online_followers",
        FollowerCount => "follower_count",
    }
}

impl Metric {
    /// Demographic metrics can only be queried with a timeframe.
    #[must_use]
    pub fn is_demographic(self) -> bool {
        matches!(
            self,
            Metric::AudienceDemographics
                | Metric::EngagedAudienceDemographics
                | Metric::FollowerDemographics
        )
    }
}

vocabulary! {
    /// Aggregation period.
    Period, "period" {
        Day => "day",
        Week => "week",
        Lifetime => "lifetime",
    }
}

vocabulary! {
    /// How results are aggregated.
    MetricType, "metric_type" {
        TotalValue => "total_value",
        TimeSeries => "time_series",
    }
}

vocabulary! {
    Breakdown, "breakdown" {
        ContactButtonType => "contact_button_type",
        FollowType => "follow_type",
        MediaProductType => "media_product_type",
    }
}

vocabulary! {
    /// Relative lookback window for demographic metrics.
    Timeframe, "timeframe" {
        Last7Days => "last_7_days",
        Last14Days => "last_14_days",
        Last30Days => "last_30_days",
        Last90Days => "last_90_days",
    }
}

/// One account insights query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsRequest {
    pub instagram_account_id: String,
    pub metrics: Vec<Metric>,
    pub period: Period,
    pub metric_type: MetricType,
    #[serde(default)]
    pub breakdowns: Vec<Breakdown>,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    /// Unix seconds. Defaults to one year before tomorrow.
    #[serde(default)]
    pub since: Option<i64>,
    /// Unix seconds. Defaults to now.
    #[serde(default)]
    pub until: Option<i64>,
    /// Overrides the configured token for this call only.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl InsightsRequest {
    /// Checks the request shape without touching the network.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the account id or metric list is
    /// empty, or a demographic metric is requested without a timeframe.
    pub fn validate(&self) -> Result<(), String> {
        if self.instagram_account_id.trim().is_empty() {
            return Err("instagram_account_id is required".to_owned());
        }
        if self.metrics.is_empty() {
            return Err("At least one metric is required".to_owned());
        }
        if self.timeframe.is_none() && self.metrics.iter().any(|m| m.is_demographic()) {
            return Err("Timeframe is required for demographic metrics".to_owned());
        }
        Ok(())
    }
}

/// Default `(since, until)` in Unix seconds for a query issued at `now`.
///
/// `since` is 365 days before tomorrow, `until` is `now`. Computed per call,
/// so two calls a second apart may differ.
#[must_use]
pub fn default_time_range(now: DateTime<Utc>) -> (i64, i64) {
    let tomorrow = now + Duration::days(1);
    let since = tomorrow - Duration::days(365);
    (since.timestamp(), now.timestamp())
}

/// Builds the flat query parameters for `request`, filling in the default
/// time range relative to `now`. The access token is not included.
#[must_use]
pub fn build_query(request: &InsightsRequest, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    let (default_since, default_until) = default_time_range(now);

    let mut params = vec![
        ("metric", join(request.metrics.iter().map(|m| m.as_str()))),
        ("period", request.period.as_str().to_owned()),
        ("metric_type", request.metric_type.as_str().to_owned()),
    ];
    if !request.breakdowns.is_empty() {
        params.push(("breakdown", join(request.breakdowns.iter().map(|b| b.as_str()))));
    }
    if let Some(timeframe) = request.timeframe {
        params.push(("timeframe", timeframe.as_str().to_owned()));
    }
    params.push(("since", request.since.unwrap_or(default_since).to_string()));
    params.push(("until", request.until.unwrap_or(default_until).to_string()));
    params
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(metrics: Vec<Metric>) -> InsightsRequest {
        InsightsRequest {
            instagram_account_id: "17841400000".to_owned(),
            metrics,
            period: Period::Day,
            metric_type: MetricType::TotalValue,
            breakdowns: Vec::new(),
            timeframe: None,
            since: None,
            until: None,
            access_token: None,
        }
    }

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn vocabulary_round_trips_through_strings() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), *metric);
        }
        assert_eq!("last_30_days".parse::<Timeframe>(), Ok(Timeframe::Last30Days));
        let err = "impressions".parse::<Metric>().unwrap_err();
        assert_eq!(err.to_string(), "unknown metric \"impressions\"");
    }

    #[test]
    fn only_three_metrics_are_demographic() {
        let demographic: Vec<_> = Metric::ALL.iter().filter(|m| m.is_demographic()).collect();
        assert_eq!(demographic.len(), 3);
        assert!(!Metric::OnlineFollowers.is_demographic());
    }

    #[test]
    fn demographic_without_timeframe_is_invalid() {
        let req = request(vec![Metric::Reach, Metric::FollowerDemographics]);
        assert_eq!(
            req.validate().unwrap_err(),
            "Timeframe is required for demographic metrics"
        );

        let mut with_timeframe = req.clone();
        with_timeframe.timeframe = Some(Timeframe::Last30Days);
        assert!(with_timeframe.validate().is_ok());
    }

    #[test]
    fn empty_metric_list_is_invalid() {
        assert!(request(Vec::new()).validate().is_err());
    }

    #[test]
    fn default_time_range_spans_one_year_before_tomorrow() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let (since, until) = default_time_range(now);
        assert_eq!(until, now.timestamp());
        assert_eq!(until - since, 364 * 86_400);
    }

    #[test]
    fn build_query_joins_lists_and_fills_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let mut req = request(vec![Metric::Likes, Metric::Comments]);
        req.breakdowns = vec![Breakdown::MediaProductType, Breakdown::FollowType];
        let params = build_query(&req, now);

        assert_eq!(param(&params, "metric"), Some("likes,comments"));
        assert_eq!(param(&params, "period"), Some("day"));
        assert_eq!(param(&params, "metric_type"), Some("total_value"));
        assert_eq!(param(&params, "breakdown"), Some("media_product_type,follow_type"));
        assert_eq!(param(&params, "timeframe"), None);
        let until = now.timestamp().to_string();
        assert_eq!(param(&params, "until"), Some(until.as_str()));
        assert!(param(&params, "access_token").is_none());
    }

    #[test]
    fn build_query_keeps_explicit_range() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let mut req = request(vec![Metric::FollowerDemographics]);
        req.timeframe = Some(Timeframe::Last7Days);
        req.since = Some(1_700_000_000);
        req.until = Some(1_700_086_400);
        let params = build_query(&req, now);

        assert_eq!(param(&params, "timeframe"), Some("last_7_days"));
        assert_eq!(param(&params, "since"), Some("1700000000"));
        assert_eq!(param(&params, "until"), Some("1700086400"));
    }
}
