//! Interaction graph crawler.
//!
//! Builds an undirected graph of users around two reference communities.
//! Seeding adds every author found in the communities' top submissions and
//! connects co-authors with in-group edges. Expansion then follows each of
//! those users elsewhere on the platform and connects users who meet there
//! with out-group edges.
//!
//! # Example
//!
//! ```rust,ignore
//! use forum_client::FixtureClient;
//! use interaction_graph::{run_crawl, write_gexf, CrawlConfig, ReferencePair};
//!
//! let client = FixtureClient::debug_pair();
//! let pair = ReferencePair::new("100pushups", "MakeupAddiction");
//! let outcome = run_crawl(&client, &pair, &CrawlConfig::new().debug()).await?;
//!
//! write_gexf(&outcome.graph, &mut std::io::stdout())?;
//! ```

pub mod config;
pub mod crawl;
pub mod error;
pub mod expansion;
pub mod flatten;
pub mod gexf;
pub mod graph;
pub mod seeding;
pub mod testing;

pub use config::{CrawlConfig, ReferencePair};
pub use crawl::{run_crawl, CrawlOutcome, CrawlPhase};
pub use error::{CrawlError, GraphError, GraphResult, Result};
pub use expansion::{expand, expand_user, ExpansionReport};
pub use flatten::flatten;
pub use gexf::{output_filename, write_gexf};
pub use graph::{Edge, EdgeKey, EdgeKind, GraphStore, Node};
pub use seeding::{seed, seed_community, seed_submission, CoAuthors, SeedingReport};
