use std::time::Duration;

use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime, Time};
use tracing::{debug, info};

use crate::types::{ClipMetadata, GameId};

#[derive(Debug, Deserialize)]
struct ClipsEnvelope {
    data: Vec<ClipMetadata>,
}

/// Client of the clips listing endpoint
pub struct Catalogue {
    agent: ureq::Agent,
    endpoint: String,
    client_id: String,
}

impl Catalogue {
    pub fn new(endpoint: &str, client_id: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .build(),
            endpoint: endpoint.to_owned(),
            client_id: client_id.to_owned(),
        }
    }

    /// The most viewed clips of the game since `started_at`, best first.
    /// Failures here are fatal, without a listing there is no batch.
    pub fn top_clips(
        &self,
        game: GameId,
        started_at: &str,
        max_clips: u32,
    ) -> Result<Vec<ClipMetadata>> {
        debug!("Querying {} for game {game}", self.endpoint);

        let response = self
            .agent
            .get(&self.endpoint)
            .query("game_id", &game.to_string())
            .query("first", &max_clips.to_string())
            .query("started_at", started_at)
            .set("Client-ID", &self.client_id)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, response) => miette!(
                    "The catalogue rejected the listing request with status {code}: {}",
                    response.into_string().unwrap_or_default().trim()
                ),
                ureq::Error::Transport(err) => miette!("Could not reach the catalogue: {err}"),
            })?;

        let envelope: ClipsEnvelope = response
            .into_json()
            .into_diagnostic()
            .wrap_err("Could not parse the clips listing")?;

        info!("{} clips listed by the catalogue", envelope.data.len());
        Ok(envelope.data)
    }
}

/// RFC 3339 start of the listing window: midnight UTC, `days` days back
pub fn window_start(days: u32) -> Result<String> {
    let day = OffsetDateTime::now_utc() - time::Duration::days(i64::from(days));
    day.replace_time(Time::MIDNIGHT)
        .format(&Rfc3339)
        .into_diagnostic()
        .wrap_err("Could not format the listing window start")
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::testing;

    const LISTING: &str = indoc! {r#"
        {
            "data": [
                {
                    "id": "AwkwardHelplessSalamanderSwiftRage",
                    "url": "https://clips.twitch.tv/AwkwardHelplessSalamanderSwiftRage",
                    "embed_url": "https://clips.twitch.tv/embed?clip=AwkwardHelplessSalamanderSwiftRage",
                    "broadcaster_id": "67955580",
                    "broadcaster_name": "ChewieMelodies",
                    "creator_name": "stereotype_",
                    "game_id": "33214",
                    "title": "babymetal",
                    "view_count": 112,
                    "created_at": "2017-11-30T22:34:18Z"
                },
                {
                    "id": "SecondClip",
                    "url": "https://clips.twitch.tv/SecondClip",
                    "broadcaster_name": "somecaster",
                    "title": "nice shot",
                    "view_count": 80
                }
            ]
        }
    "#};

    #[test]
    fn parses_the_listing_in_order() {
        let endpoint = testing::serve_json(LISTING);
        let catalogue = Catalogue::new(&endpoint, "fixture-client-id");

        let clips = catalogue
            .top_clips(GameId::FORTNITE, "2017-11-01T00:00:00Z", 50)
            .unwrap();

        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].id, "AwkwardHelplessSalamanderSwiftRage");
        assert_eq!(clips[0].broadcaster_name, "ChewieMelodies");
        assert_eq!(
            clips[0].page_url,
            "https://clips.twitch.tv/AwkwardHelplessSalamanderSwiftRage"
        );
        assert_eq!(clips[1].title, "nice shot");
    }

    #[test]
    fn a_rejected_request_is_fatal() {
        let endpoint = testing::serve_status(401);
        let catalogue = Catalogue::new(&endpoint, "bad-client-id");

        let err = catalogue
            .top_clips(GameId::FORTNITE, "2017-11-01T00:00:00Z", 50)
            .unwrap_err();

        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn an_unparseable_listing_is_fatal() {
        let endpoint = testing::serve_json("{\"data\": \"not an array\"}");
        let catalogue = Catalogue::new(&endpoint, "fixture-client-id");

        assert!(catalogue
            .top_clips(GameId::FORTNITE, "2017-11-01T00:00:00Z", 50)
            .is_err());
    }

    #[test]
    fn window_start_is_a_utc_midnight() {
        let start = window_start(7).unwrap();
        assert!(start.ends_with("T00:00:00Z"));

        let parsed = OffsetDateTime::parse(&start, &Rfc3339).unwrap();
        assert_eq!(parsed.time(), Time::MIDNIGHT);

        let age = OffsetDateTime::now_utc() - parsed;
        assert!(age >= time::Duration::days(7));
        assert!(age < time::Duration::days(8) + time::Duration::minutes(1));
    }
}
