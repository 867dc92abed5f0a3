use clap::{App, Arg};
use zimdex::{TitleIndex, Zim};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = App::new("zim-search")
        .version("0.1")
        .about("Search zim files by article title")
        .arg(
            Arg::with_name("index")
                .short("i")
                .long("index")
                .help("Where the title index lives (built on first use)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("limit")
                .short("n")
                .long("limit")
                .help("Maximum number of results to print")
                .takes_value(true)
                .default_value("10"),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("The zim file to search")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("KEYWORDS")
                .help("The keywords to search for")
                .required(true)
                .multiple(true)
                .index(2),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let index_path = matches
        .value_of("index")
        .map(String::from)
        .unwrap_or_else(|| format!("{}.idx", input));
    let limit: usize = matches
        .value_of("limit")
        .unwrap()
        .parse()
        .expect("limit must be a number");
    let keywords: Vec<&str> = matches.values_of("KEYWORDS").unwrap().collect();

    let zim_file = Zim::new(input).expect("failed to parse input");
    let index = TitleIndex::open_or_build(&index_path, &zim_file).expect("failed to open index");

    let hits = index.search(&zim_file, &keywords).expect("search failed");

    if hits.is_empty() {
        println!("no results for: {}", keywords.join(" "));
        return;
    }

    for hit in hits.iter().take(limit) {
        println!("{:8.3}  A/{}  {}", hit.score, hit.url, hit.title);
    }
}
