fn main() {
    if let Err(e) = skill_links::run() {
        eprintln!("skill-links: {e}");
        std::process::exit(1);
    }
}
