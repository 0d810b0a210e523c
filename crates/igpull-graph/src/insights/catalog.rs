//! Static reference data served by the metadata endpoints. No network calls.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

const SAMPLE_BASE: &str =
    "/api/v1/instagram/insights?instagram_account_id=ACCOUNT_ID&access_token=YOUR_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRequest {
    pub url: String,
    pub description: String,
}

/// Canned insights queries keyed by a short name.
#[must_use]
pub fn sample_requests() -> BTreeMap<&'static str, SampleRequest> {
    let samples = [
        (
            "reach_engagement_day",
            "&metrics=reach,profile_views,accounts_engaged&period=day&metric_type=total_value",
            "Get total reach, profile views, and engaged accounts for the day",
        ),
        (
            "reach_engagement_time_series",
            "&metrics=reach,profile_views,accounts_engaged&period=day&metric_type=time_series",
            "Get time series data for reach, profile views, and engaged accounts",
        ),
        (
            "follower_demographics",
            "&metrics=follower_demographics&period=lifetime&metric_type=total_value&timeframe=last_30_days",
            "Get follower demographics for the last 30 days",
        ),
        (
            "content_interactions_with_breakdown",
            "&metrics=likes,comments,shares&period=day&metric_type=total_value&breakdowns=media_product_type",
            "Get content interactions broken down by media type",
        ),
        (
            "audience_reach_breakdown",
            "&metrics=reach,accounts_engaged&period=day&metric_type=total_value&breakdowns=media_product_type,follow_type",
            "Get reach and engaged accounts broken down by media type and follow type",
        ),
    ];

    samples
        .into_iter()
        .map(|(key, query, description)| {
            (
                key,
                SampleRequest {
                    url: format!("{SAMPLE_BASE}{query}"),
                    description: description.to_owned(),
                },
            )
        })
        .collect()
}

/// Descriptions and period requirements of every queryable metric.
#[must_use]
pub fn metrics_info() -> Value {
    let day_and_lifetime = "Available for day and lifetime periods";
    let needs_timeframe = "Requires timeframe parameter";
    json!({
        "interaction_metrics": {
            "accounts_engaged": {"description": "Number of unique accounts that engaged with your content", "requirements": day_and_lifetime},
            "comments": {"description": "Number of comments on your content", "requirements": day_and_lifetime},
            "follows": {"description": "Number of follows of your account", "requirements": day_and_lifetime},
            "likes": {"description": "Number of likes on your content", "requirements": day_and_lifetime},
            "profile_views": {"description": "Number of views of your profile", "requirements": day_and_lifetime},
            "reach": {"description": "Number of unique accounts that saw your content", "requirements": day_and_lifetime},
            "replies": {"description": "Number of replies to your stories", "requirements": day_and_lifetime},
            "saved": {"description": "Number of saves of your content", "requirements": day_and_lifetime},
            "shares": {"description": "Number of shares of your content", "requirements": day_and_lifetime},
            "total_interactions": {"description": "Total number of interactions on your content", "requirements": day_and_lifetime},
            "views": {"description": "Number of views on your content (video)", "requirements": day_and_lifetime},
            "website_clicks": {"description": "Number of clicks on your website link", "requirements": day_and_lifetime}
        },
        "demographic_metrics": {
            "audience_demographics": {"description": "Demographic breakdown of your audience", "requirements": needs_timeframe},
            "engaged_audience_demographics": {"description": "Demographic breakdown of accounts that engaged with your content", "requirements": needs_timeframe},
            "follower_demographics": {"description": "Demographic breakdown of your followers", "requirements": needs_timeframe},
            "online_followers": {"description": "Number of your followers online over time", "requirements": "Available for day period only"},
            "follower_count": {"description": "Total number of followers", "requirements": "Available for lifetime period only"}
        }
    })
}

/// Breakdown dimensions with their values and compatible metrics.
#[must_use]
pub fn breakdowns_info() -> Value {
    json!({
        "contact_button_type": {
            "description": "Breaks down insights by type of contact button clicked",
            "values": ["call_phone_number", "text_message", "email", "directions"],
            "compatible_metrics": ["website_clicks"]
        },
        "follow_type": {
            "description": "Breaks down follows by type",
            "values": ["follow", "unfollow"],
            "compatible_metrics": ["follows"]
        },
        "media_product_type": {
            "description": "Breaks down insights by media type",
            "values": ["feed", "story", "reels"],
            "compatible_metrics": [
                "accounts_engaged", "comments", "likes", "reach",
                "saved", "shares", "total_interactions", "views"
            ]
        }
    })
}
