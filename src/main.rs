use mist::{search, DataMatrix, Error, Order, ProbabilityAlgorithm, SearchConfig};
use std::env;
use std::io::{self, Write};
use std::process;

const USAGE: &str = "usage: mist <data.csv> [tuple_size] [vector|bitset]";

fn main() -> mist::Result<()> {
    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(path) if path != "-h" && path != "--help" => path,
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };
    let tuple_size = match args.next() {
        Some(size) => size
            .parse()
            .map_err(|_| Error::config(format!("tuple size {:?} is not a number", size)))?,
        None => 2,
    };
    let algorithm = match args.next() {
        Some(name) => name.parse()?,
        None => ProbabilityAlgorithm::default(),
    };

    let data = DataMatrix::from_file(&path, Order::RowMajor)?;
    let config = SearchConfig::builder()
        .tuple_size(tuple_size)
        .probability_algorithm(algorithm)
        .build()?;
    let results = search::start(&config, &data)?;

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    results.write_csv(&mut out)?;
    out.flush()?;
    Ok(())
}
