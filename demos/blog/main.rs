//! BurrowDB demo - a small blog store.
//!
//! Demonstrates the async adapter end to end:
//! - Opening a database with an idempotent schema bootstrap
//! - Writing records through put semantics
//! - Point reads, range scans, and secondary-index scans
//!
//! Run with: cargo run -p blog_demo

use burrowdb_client::{Connection, IndexSpec, Key, KeyRange, Schema, StoreSpec};
use burrowdb_engine::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;

/// A blog post record. The title doubles as the primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlogPost {
    title: String,
    author: String,
    #[serde(rename = "publishDate")]
    publish_date: NaiveDate,
}

impl BlogPost {
    fn new(title: &str, author: &str, year: i32, month: u32, day: u32) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            publish_date: NaiveDate::from_ymd_opt(year, month, day).expect("valid date"),
        }
    }
}

fn print_posts(label: &str, records: &[Value]) {
    println!("{label}:");
    for record in records {
        match serde_json::from_value::<BlogPost>(record.clone()) {
            Ok(post) => println!("  {} - {} ({})", post.publish_date, post.title, post.author),
            Err(_) => println!("  {record}"),
        }
    }
}

fn blog_schema() -> Schema {
    Schema::new().with_store(
        StoreSpec::new("blog", "title")
            .with_index(IndexSpec::new("AuthorIndex", "author"))
            .with_index(IndexSpec::new("PublishDateIndex", "publishDate")),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = Engine::start();
    let conn = Connection::open(&engine.handle(), "myDatabase", &blog_schema()).await?;

    let posts = [
        BlogPost::new("Async adapters in practice", "maya", 2018, 3, 10),
        BlogPost::new("Materializing cursor scans", "maya", 2018, 3, 2),
        BlogPost::new("Version-change upgrades", "piotr", 2017, 11, 13),
    ];
    for post in &posts {
        conn.write_record("blog", serde_json::to_value(post)?).await?;
    }
    println!("wrote {} posts", posts.len());

    let found = conn
        .read_record("blog", "Version-change upgrades".into())
        .await?;
    match found {
        Some(record) => print_posts("point read by title", &[record]),
        None => println!("point read by title: absent"),
    }

    let from_m = conn.scan_range("blog", "M").await?;
    print_posts("titles from \"M\" onward", &from_m);

    let by_maya = conn
        .scan_index("blog", "AuthorIndex", Key::from("maya"))
        .await?;
    print_posts("posts by maya", &by_maya);

    let in_2018 = conn
        .scan_index(
            "blog",
            "PublishDateIndex",
            KeyRange::bound("2018-01-01", "2018-12-31"),
        )
        .await?;
    print_posts("posts published in 2018", &in_2018);

    engine.shutdown();
    Ok(())
}
