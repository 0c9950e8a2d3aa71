// Common test utilities

use forum_client::{FixtureClient, DEBUG_COMMUNITIES};
use interaction_graph::{run_crawl, write_gexf, CrawlConfig, CrawlOutcome, GraphStore, ReferencePair};

pub const PUSHUPS_PERMALINK: &str =
    "/r/100pushups/comments/1v1wvy/i_just_finished_the_initial_test_and_am_ready_to/";
pub const MAKEUP_PERMALINK: &str =
    "/r/MakeupAddiction/comments/1jwg3o/159_including_shipping_for_12_assorted_eye_liners/";
pub const FITNESS_PERMALINK: &str = "/r/Fitness/comments/fit001/daily_simple_questions_thread/";

pub fn debug_pair() -> ReferencePair {
    ReferencePair::new(DEBUG_COMMUNITIES.0, DEBUG_COMMUNITIES.1)
}

/// Debug settings with no pauses between failures.
pub fn debug_config() -> CrawlConfig {
    CrawlConfig::new().debug().without_cooldowns()
}

pub async fn crawl(client: &FixtureClient, pair: &ReferencePair) -> CrawlOutcome {
    run_crawl(client, pair, &debug_config())
        .await
        .expect("crawl should not violate graph invariants")
}

pub fn render(graph: &GraphStore) -> String {
    let mut buf = Vec::new();
    write_gexf(graph, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8(buf).expect("GEXF output is UTF-8")
}

pub fn user_of(graph: &GraphStore, user: &str) -> Vec<String> {
    graph
        .node(user)
        .unwrap_or_else(|| panic!("{} should be a node", user))
        .user_of
        .iter()
        .cloned()
        .collect()
}
