use clap::Parser;
use docpress::config::load_credentials;
use docpress::{CrawlRequest, CrawlResult, Harvester, Session};

mod args;
use args::{Args, convert_strategy};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!("Starting harvester for URL: {}", args.url);

    println!("Note: harvesting requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
    );

    if let Err(e) = run(&args).await {
        ::log::error!("Harvest failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> docpress::Result<()> {
    let mut harvester = Harvester::new(&args.url)
        .with_output_dir(args.out.clone())
        .with_strategy(convert_strategy(args.strategy))
        .with_timeout(args.timeout)
        .with_retries(args.retries)
        .with_page_delay(args.delay_ms);

    if let Some(user_agent) = &args.user_agent {
        harvester = harvester.with_user_agent(user_agent);
    }
    if let Some(path) = &args.cookies {
        harvester = harvester.with_credentials(load_credentials(path)?);
    }

    let session = harvester.open().await?;
    let outcome = dispatch(&harvester, &session, args).await;
    session.close().await;
    outcome
}

async fn dispatch(harvester: &Harvester, session: &Session, args: &Args) -> docpress::Result<()> {
    // List-only mode: discovery without fetching
    if args.list {
        let links = harvester.discover(session).await?;
        for (position, link) in links.iter().enumerate() {
            println!("{:3}  {}  ({})", position + 1, link.text, link.url);
        }
        println!("{} link(s) discovered", links.len());
        return Ok(());
    }

    if args.crawl {
        let request = CrawlRequest {
            max_pages: args.max_pages,
            filter: args.filter.clone(),
            start_index: args.start_index,
        };
        let start_time = std::time::Instant::now();
        let results = harvester.crawl(session, &request).await?;
        report(&results, start_time.elapsed());
        return Ok(());
    }

    // Default: harvest the single given page
    let page = harvester.harvest_page(session, &args.url).await?;
    println!(
        "Saved {} ({} min read) -> {}",
        page.title,
        page.reading_minutes,
        page.artifacts.pdf.display()
    );
    Ok(())
}

fn report(results: &[CrawlResult], elapsed: std::time::Duration) {
    for result in results {
        match result {
            CrawlResult::Success(page) => {
                println!("  ok   {} -> {}", page.url, page.artifacts.pdf.display());
            }
            CrawlResult::Failure { url, index, error } => {
                println!("  FAIL {url} (index {index}): {error}");
            }
        }
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    println!(
        "Harvested {} of {} page(s) in {:.1}s",
        succeeded,
        results.len(),
        elapsed.as_secs_f64()
    );
    ::log::info!(
        "Crawl complete - {} of {} pages harvested",
        succeeded,
        results.len()
    );
}
