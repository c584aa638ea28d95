//! Client side of the ENS friend graph: API access, graph state, name
//! resolution and the visualization model.

pub mod api;
pub mod avatar;
pub mod error;
pub mod pairs;
pub mod render;
pub mod resolver;
pub mod state;

pub use api::{FriendsApi, HttpFriendsApi, DEFAULT_API_URL};
pub use avatar::{backfill_avatars, AvatarCache};
pub use error::{ClientError, ClientResult, PairParseError, ResolveError};
pub use pairs::parse_pair;
pub use render::{build_visual_graph, stable_hash, NodeImage, VisualEdge, VisualGraph, VisualNode};
pub use resolver::{EnsProfile, NameResolver, RpcNameResolver, DEFAULT_RPC_URL, TEXT_RECORD_KEYS};
pub use state::GraphState;
