use mockito::{Matcher, Server, ServerGuard};
use newstrace::fetch::HttpFetcher;
use newstrace::outputs::checkpoint::read_profiles;
use newstrace::{Config, Pipeline};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const HOME: &str = r#"
<html><body>
  <a href="/news/2024/05/01/alpha">Alpha</a>
  <a href="/news/2024/05/02/beta?utm_source=home">Beta</a>
  <a href="/news/2024/05/03/gamma#comments">Gamma</a>
  <a href="/private/2024/05/04/secret">Secret</a>
</body></html>
"#;

const ALPHA: &str = r#"
<html><head>
  <title>Alpha story</title>
  <meta property="article:section" content="World">
</head><body>
  <div class="byline">By Meera Nair</div>
  <time datetime="2024-05-01">May 1</time>
</body></html>
"#;

const BETA: &str = r#"
<html><head>
  <title>Beta story</title>
  <script type="application/ld+json">{"@type": "NewsArticle", "datePublished": "2024-05-02T08:00:00Z"}</script>
</head><body>
  <nav class="breadcrumb"><a href="/">Home</a> <a href="/business">Business</a></nav>
  <div class="byline">By Meera Nair and Tom Hale</div>
</body></html>
"#;

const GAMMA: &str = r#"
<html><head><title>Gamma story</title></head>
<body><span class="author">Staff</span><p>Published 2024-05-03</p></body></html>
"#;

async fn page(server: &mut ServerGuard, path: &str, body: &str, hits: usize) -> mockito::Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

fn config(dir: &TempDir, search_url: &str) -> Config {
    Config {
        output: dir.path().join("out/data.json"),
        tlds: Vec::new(),
        search_endpoints: vec![format!("{search_url}/html/?q={{query}}")],
        crawl_delay_ms: 0,
        request_timeout_secs: 5,
        checkpoint_every: 1,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_outlet_to_profiles_end_to_end() {
    let mut site = Server::new_async().await;
    let mut search = Server::new_async().await;

    let robots = site
        .mock("GET", "/robots.txt")
        .with_status(200)
        .with_body("User-agent: *\nDisallow: /private\n")
        .expect(1)
        .create_async()
        .await;
    let home = page(&mut site, "/", HOME, 1).await;
    let alpha = page(&mut site, "/news/2024/05/01/alpha", ALPHA, 1).await;
    let beta = page(&mut site, "/news/2024/05/02/beta", BETA, 1).await;
    let gamma = page(&mut site, "/news/2024/05/03/gamma", GAMMA, 1).await;
    let secret = page(&mut site, "/private/2024/05/04/secret", "<html></html>", 0).await;

    let target = urlencoding::encode(&format!("{}/", site.url())).into_owned();
    let results = search
        .mock("GET", "/html/")
        .match_query(Matcher::UrlEncoded(
            "q".into(),
            "Example Herald official website".into(),
        ))
        .with_status(200)
        .with_body(format!(
            r#"<a href="/settings">Settings</a>
               <a href="/l/?uddg={target}&rut=1">Example Herald</a>"#
        ))
        .expect(1)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let config = config(&dir, &search.url());
    let output = config.output.clone();
    let pipeline = Pipeline::new(config, HttpFetcher::new("NewsTraceTest/1.0").unwrap());

    let snapshot = pipeline.run("Example Herald").await;

    assert_eq!(snapshot.outlet_name, "Example Herald");
    assert_eq!(snapshot.website, site.url());
    assert_eq!(snapshot.note, None);

    let summary: Vec<_> = snapshot
        .profiles
        .iter()
        .map(|p| {
            (
                p.name.as_str(),
                p.beat.as_str(),
                p.articles_count,
                p.latest_article.as_str(),
                p.publication_date.as_str(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Meera Nair", "World", 2, "Beta story", "2024-05-02T08:00:00Z"),
            ("Tom Hale", "Business", 1, "Beta story", "2024-05-02T08:00:00Z"),
        ]
    );
    assert_eq!(
        snapshot.profiles[0].article_url,
        format!("{}/news/2024/05/02/beta", site.url())
    );

    assert_eq!(read_profiles(&output).unwrap(), snapshot.profiles);
    let raw = std::fs::read_to_string(&output).unwrap();
    assert!(!raw.contains("_note"));

    robots.assert_async().await;
    home.assert_async().await;
    alpha.assert_async().await;
    beta.assert_async().await;
    gamma.assert_async().await;
    secret.assert_async().await;
    results.assert_async().await;
}

#[tokio::test]
async fn test_undetectable_outlet_still_writes_snapshot() {
    let mut search = Server::new_async().await;
    let results = search
        .mock("GET", "/html/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html><body><p>No results.</p></body></html>")
        .expect(1)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let config = config(&dir, &search.url());
    let output = config.output.clone();
    let pipeline = Pipeline::new(config, HttpFetcher::new("NewsTraceTest/1.0").unwrap());

    let snapshot = pipeline.run("Nonexistent Chronicle").await;

    assert_eq!(snapshot.website, "");
    assert!(snapshot.profiles.is_empty());
    assert_eq!(read_profiles(&output).unwrap(), vec![]);
    results.assert_async().await;
}
