fn main() {
    if let Err(err) = eu_renewables::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
