//! Command-line front end for the ENS friend graph.
//!
//! Talks to a running graph API for graph operations and to a JSON-RPC
//! endpoint for name lookups.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ensgraph_client::{
    backfill_avatars, build_visual_graph, parse_pair, AvatarCache, FriendsApi, GraphState,
    HttpFriendsApi, NameResolver, RpcNameResolver, DEFAULT_API_URL, DEFAULT_RPC_URL,
};
use ensgraph_core::{init_logging, normalize_ens_name};
use serde::Serialize;

/// ENS lookup and friend graph tool.
#[derive(Parser, Debug)]
#[command(name = "ensgraph", author, version, about, long_about = None)]
struct Args {
    /// Graph API base URL.
    #[arg(long, env = "ENSGRAPH_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Ethereum JSON-RPC endpoint for name lookups.
    #[arg(long, env = "ETH_RPC_URL", default_value = DEFAULT_RPC_URL, global = true)]
    rpc_url: String,

    /// Log level written to stderr.
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Resolve a name to its address, avatar and text records.
    Lookup { name: String },
    /// Print the visualization model of the current graph as JSON.
    Graph {
        /// Skip avatar resolution.
        #[arg(long)]
        no_avatars: bool,
    },
    /// List stored relationships, newest first.
    Relationships,
    /// Add one relationship.
    Add { user_id: String, friend_id: String },
    /// Add relationships given as `name, name` pairs; `.eth` is appended when missing.
    Batch {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Add standalone nodes.
    Nodes {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete the relationship between two names, in either orientation.
    Delete { user_id: String, friend_id: String },
    /// Delete a node and every relationship touching it.
    DeleteNode { name: String },
    /// Delete every relationship in the graph.
    Clear,
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn loaded_state(api: HttpFriendsApi) -> Result<GraphState<HttpFriendsApi>> {
    let mut state = GraphState::new(api);
    state.refetch().await;
    match state.error() {
        Some(error) => Err(anyhow!("failed to load graph: {error}")),
        None => Ok(state),
    }
}

async fn run(args: Args) -> Result<()> {
    let api = HttpFriendsApi::new(&args.api_url)
        .with_context(|| format!("invalid API URL {}", args.api_url))?;

    match args.command {
        Command::Lookup { name } => {
            let resolver = RpcNameResolver::new(args.rpc_url)?;
            match resolver.resolve_profile(&name).await {
                Some(profile) => print_json(&profile)?,
                None => println!("No ENS profile found for {name}"),
            }
        }
        Command::Graph { no_avatars } => {
            let state = loaded_state(api).await?;
            let mut avatars = AvatarCache::new();
            if !no_avatars {
                let resolver = RpcNameResolver::new(args.rpc_url)?;
                backfill_avatars(state.graph(), &mut avatars, &resolver).await;
            }
            print_json(&build_visual_graph(state.graph(), &avatars))?;
        }
        Command::Relationships => {
            let relationships = api.list_relationships().await?;
            print_json(&relationships)?;
        }
        Command::Add { user_id, friend_id } => {
            let mut state = GraphState::new(api);
            let created = state.add_relationship(&user_id, &friend_id).await?;
            println!("Added {} <-> {}", created.user_id, created.friend_id);
        }
        Command::Batch { pairs } => {
            let pairs = pairs
                .iter()
                .map(|raw| parse_pair(raw).with_context(|| format!("invalid pair `{raw}`")))
                .collect::<Result<Vec<_>>>()?;
            let mut state = GraphState::new(api);
            let result = state.add_relationships_batch(&pairs).await?;
            println!(
                "Created {} relationships, skipped {}",
                result.created.len(),
                result.skipped
            );
        }
        Command::Nodes { names } => {
            let names = names
                .iter()
                .map(|raw| normalize_ens_name(raw).with_context(|| format!("invalid name `{raw}`")))
                .collect::<Result<Vec<_>>>()?;
            let mut state = GraphState::new(api);
            let stored = state.add_nodes_batch(&names).await?;
            println!("Stored {stored} nodes");
        }
        Command::Delete { user_id, friend_id } => {
            let mut state = GraphState::new(api);
            state.delete_relationship(&user_id, &friend_id).await?;
            println!("Deleted {user_id} <-> {friend_id}");
        }
        Command::DeleteNode { name } => {
            api.delete_node(&name).await?;
            println!("Deleted node {name}");
        }
        Command::Clear => {
            let mut state = loaded_state(api).await?;
            let total = state.graph().edges.len();
            let mut avatars = AvatarCache::new();
            let removed = state.clear_all(&mut avatars).await;
            println!("Removed {removed} of {total} relationships");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, None).map_err(|err| anyhow!(err))?;
    run(args).await
}

#[cfg(test)]
mod tests {
    use super::{Args, Command};
    use clap::Parser;

    #[test]
    fn parses_batch_pairs() {
        let args = Args::try_parse_from(["ensgraph", "batch", "vitalik, nick", "a.eth,b.eth"]).unwrap();
        assert_eq!(
            args.command,
            Command::Batch {
                pairs: vec!["vitalik, nick".to_string(), "a.eth,b.eth".to_string()]
            }
        );
    }

    #[test]
    fn batch_requires_a_pair() {
        assert!(Args::try_parse_from(["ensgraph", "batch"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::try_parse_from([
            "ensgraph",
            "graph",
            "--no-avatars",
            "--api-url",
            "http://graph.internal:8080",
        ])
        .unwrap();
        assert_eq!(args.api_url, "http://graph.internal:8080");
        assert_eq!(args.command, Command::Graph { no_avatars: true });
    }

    #[test]
    fn delete_node_uses_kebab_case() {
        let args = Args::try_parse_from(["ensgraph", "delete-node", "x.eth"]).unwrap();
        assert_eq!(
            args.command,
            Command::DeleteNode {
                name: "x.eth".to_string()
            }
        );
    }
}
