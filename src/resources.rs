use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Live scores move every few seconds.
pub const LIVE_SCORES_INTERVAL: Duration = Duration::from_secs(4);
/// Team rankings shift at most a few times a day.
pub const RANKINGS_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Reference data (countries, teams, players, ...).
pub const STATIC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// How raw upstream records are reduced before caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Keep the upstream collection as-is
    Identity,
    Country,
    Team,
    Player,
}

/// One category of cricket data, each with its own slot and cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Countries,
    Rankings,
    LiveScores,
    Teams,
    Players,
    Leagues,
    Fixtures,
    Seasons,
    Officials,
    Scores,
    /// Proxied per request; never cached or scheduled
    News,
}

impl ResourceType {
    /// Every resource backed by a cache slot and a refresh task.
    pub const CACHED: [ResourceType; 10] = [
        ResourceType::Countries,
        ResourceType::Rankings,
        ResourceType::LiveScores,
        ResourceType::Teams,
        ResourceType::Players,
        ResourceType::Leagues,
        ResourceType::Fixtures,
        ResourceType::Seasons,
        ResourceType::Officials,
        ResourceType::Scores,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Countries => "countries",
            ResourceType::Rankings => "rankings",
            ResourceType::LiveScores => "live_scores",
            ResourceType::Teams => "teams",
            ResourceType::Players => "players",
            ResourceType::Leagues => "leagues",
            ResourceType::Fixtures => "fixtures",
            ResourceType::Seasons => "seasons",
            ResourceType::Officials => "officials",
            ResourceType::Scores => "scores",
            ResourceType::News => "news",
        }
    }

    /// Path relative to the upstream API base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResourceType::Rankings => "team-rankings",
            ResourceType::LiveScores => "livescores",
            ResourceType::News => "v2/everything",
            other => other.name(),
        }
    }

    /// Resource-specific query parameters; the access token is added by the client.
    pub fn params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ResourceType::LiveScores => &[("include", "runs,batting,bowling")],
            ResourceType::News => &[
                ("q", "sports"),
                ("pageSize", "13"),
                ("language", "en"),
                ("sortBy", "publishedAt"),
            ],
            _ => &[],
        }
    }

    /// Refresh cadence, or `None` for request-scoped resources.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            ResourceType::LiveScores => Some(LIVE_SCORES_INTERVAL),
            ResourceType::Rankings => Some(RANKINGS_INTERVAL),
            ResourceType::News => None,
            _ => Some(STATIC_INTERVAL),
        }
    }

    pub fn normalization(&self) -> Normalization {
        match self {
            ResourceType::Countries => Normalization::Country,
            ResourceType::Teams => Normalization::Team,
            ResourceType::Players => Normalization::Player,
            _ => Normalization::Identity,
        }
    }

    /// Route served to the frontend.
    pub fn route(&self) -> &'static str {
        match self {
            ResourceType::Countries => "/api/countries",
            ResourceType::Rankings => "/api/rankings",
            ResourceType::LiveScores => "/api/livescores",
            ResourceType::Teams => "/api/teams",
            ResourceType::Players => "/api/players",
            ResourceType::Leagues => "/api/leagues",
            ResourceType::Fixtures => "/api/fixtures",
            ResourceType::Seasons => "/api/seasons",
            ResourceType::Officials => "/api/officials",
            ResourceType::Scores => "/api/scores",
            ResourceType::News => "/api/news",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
