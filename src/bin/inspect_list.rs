use chrono::Local;
use inboxtui::models::{ActiveFilters, FilterFlag, MessageCategory, SortOrder};
use inboxtui::pipeline::{self, ListQuery};
use inboxtui::seed;
use std::env;

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} <folder> [--category <name>] [--filter <a,b,..>] [--sort <key[:asc|desc]>] [--json]",
        program
    );
    eprintln!("Prints the message list the UI would show for the bundled seed mailbox.");
    std::process::exit(1);
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let folder_id = &args[1];
    let mut category = MessageCategory::Primary;
    let mut filters = ActiveFilters::default();
    let mut sort = SortOrder::default();
    let mut json = false;

    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--category" => {
                let value = rest.next().unwrap_or_else(|| usage(&args[0]));
                category = MessageCategory::parse(value)
                    .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", value))?;
            }
            "--filter" => {
                let value = rest.next().unwrap_or_else(|| usage(&args[0]));
                for name in value.split(',').filter(|n| !n.is_empty()) {
                    let flag = FilterFlag::parse(name)
                        .ok_or_else(|| anyhow::anyhow!("Unknown filter: {}", name))?;
                    filters.set(flag, true);
                }
            }
            "--sort" => {
                let value = rest.next().unwrap_or_else(|| usage(&args[0]));
                sort = SortOrder::parse(value)
                    .ok_or_else(|| anyhow::anyhow!("Invalid sort order: {}", value))?;
            }
            _ => usage(&args[0]),
        }
    }

    let now = Local::now();
    let mailbox = seed::load_seed(now.timestamp_millis())?;
    let Some(folder) = mailbox.folders.iter().find(|f| &f.id == folder_id) else {
        println!("No folder named '{}'", folder_id);
        return Ok(());
    };

    let query = ListQuery {
        folder: Some(folder),
        category,
        filters,
        sort,
    };
    let groups = pipeline::build_view(&mailbox.messages, &query, &now);

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No messages in {}", folder.display_name);
        return Ok(());
    }
    for group in &groups {
        if let Some(bucket) = group.bucket {
            println!("== {} ==", bucket.title());
        }
        for m in &group.messages {
            let date = m.local_date().format("%Y-%m-%d %H:%M");
            let thread = m.thread_id.as_deref().unwrap_or("-");
            println!(
                "{:<4} {}  {:<22} {:<40} [{}]{}",
                m.id,
                date,
                m.sender.name,
                m.subject,
                thread,
                if m.is_read { "" } else { " *" }
            );
        }
    }

    Ok(())
}
