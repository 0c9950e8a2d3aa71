//! Forum platform client.
//!
//! Read-only access to a forum platform: community top listings, user
//! activity, and comment trees with truncation placeholders.
//!
//! # Example
//!
//! ```rust,ignore
//! use forum_client::{PlatformClient, RedditClient, RedditConfig};
//! use futures::StreamExt;
//!
//! let client = RedditClient::new(RedditConfig::default())?;
//!
//! let mut top = client.top_submissions("100pushups", Some(5));
//! while let Some(submission) = top.next().await {
//!     println!("{}", submission?.permalink);
//! }
//! ```

pub mod client;
pub mod error;
pub mod fixture;
pub mod reddit;
pub mod types;

pub use client::PlatformClient;
pub use error::{ForumError, Result};
pub use fixture::{FixtureCall, FixtureClient, DEBUG_COMMUNITIES};
pub use reddit::{RedditClient, RedditConfig};
pub use types::{Comment, CommentNode, MoreComments, Submission, SubmissionId, User};
