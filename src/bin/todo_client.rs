//! Todo Sync Client - terminal front end for the sync agent
//!
//! Prints the shared list whenever a new snapshot arrives and reads
//! commands from stdin:
//!
//! ```text
//! add <title>   create an item
//! done <id>     mark complete
//! undo <id>     mark incomplete
//! rm <id>       delete
//! list          print the current view
//! quit          exit
//! ```

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use todo_sync::client::{ClientConfig, ClientView, SyncHandle};
use todo_sync::logging;
use todo_sync::types::{AppResult, ItemId, TodoResult};

fn print_view(view: &ClientView) {
    println!("--- todos ({}) ---", view.items.len());
    if view.items.is_empty() {
        println!("No todos yet!");
    }
    for item in &view.items {
        let mark = if item.is_complete { "x" } else { " " };
        println!("[{}] {:>4}  {}", mark, item.id, item.title);
    }
}

fn parse_id(arg: &str) -> Option<ItemId> {
    arg.trim().parse().ok()
}

async fn run_command(handle: &SyncHandle, line: &str) -> Option<TodoResult<()>> {
    let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
    let result = match cmd {
        "add" => handle.create(arg).await.map(|_| ()),
        "done" | "undo" | "rm" => {
            let Some(id) = parse_id(arg) else {
                eprintln!("usage: {} <id>", cmd);
                return Some(Ok(()));
            };
            match cmd {
                "done" => handle.set_complete(id, true).await,
                "undo" => handle.set_complete(id, false).await,
                _ => handle.delete(id).await,
            }
        }
        "list" => {
            print_view(&handle.view());
            Ok(())
        }
        "quit" | "exit" => return None,
        "" => Ok(()),
        other => {
            eprintln!("unknown command: {}", other);
            Ok(())
        }
    };
    Some(result)
}

#[tokio::main]
async fn main() -> AppResult<()> {
    logging::init();

    let config = ClientConfig::from_env();
    let handle = SyncHandle::start(config)?;

    let mut views = handle.watch_view();
    let printer = tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            print_view(&view);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match run_command(&handle, line.trim()).await {
            None => break,
            Some(Err(e)) => eprintln!("error: {}", e),
            Some(Ok(())) => {}
        }
    }

    handle.shutdown_timeout(Duration::from_secs(5)).await;
    printer.abort();
    Ok(())
}
