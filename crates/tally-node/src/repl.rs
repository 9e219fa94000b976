//! Stdin command loop

use crate::error::NodeError;
use crate::node::NodeHandle;
use std::str::FromStr;
use tally_types::NodeId;
use tokio::io::{AsyncBufReadExt, BufReader};

const USAGE: &str =
    "Commands: moneyTransfer <dest> <amt>, failProcess, fixProcess, printBlockchain, printBalance, exit";

/// Run the command loop until `exit` or stdin closes.
pub async fn run(handle: NodeHandle) -> anyhow::Result<()> {
    println!("Node {} ready.", handle.id());
    println!("{}", USAGE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut explicit_exit = false;
    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["moneyTransfer", dest, amount] => {
                match (NodeId::from_str(dest), amount.parse::<u64>()) {
                    (Ok(dest), Ok(amount)) if amount > 0 => {
                        match handle.transfer(dest, amount).await {
                            Ok(()) => println!("Transfer submitted."),
                            Err(NodeError::NodeFailed) => {
                                println!("Cannot process command: node is failed.")
                            }
                            Err(NodeError::InsufficientFunds { have, need }) => {
                                println!("Transaction failed: balance {} < {}.", have, need)
                            }
                            Err(e) => println!("Transfer failed: {}", e),
                        }
                    }
                    _ => println!("Usage: moneyTransfer <dest> <amt>"),
                }
            }
            ["failProcess"] => {
                handle.fail().await?;
                println!("Node failed.");
            }
            ["fixProcess"] => {
                handle.fix().await?;
                println!("Node recovering.");
            }
            ["printBlockchain"] => {
                let snap = handle.snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&snap.chain)?);
            }
            ["printBalance"] => {
                let snap = handle.snapshot().await?;
                println!("{}", serde_json::to_string(&snap.balances)?);
            }
            ["exit"] => {
                handle.shutdown().await?;
                explicit_exit = true;
                break;
            }
            _ => println!("Unknown command. {}", USAGE),
        }
    }
    if !explicit_exit {
        // Stdin closed (e.g. running detached): keep serving the network
        // until a signal arrives.
        std::future::pending::<()>().await;
    }
    Ok(())
}
