fn main() {
    if let Err(err) = win11ready::cli::run() {
        win11ready::ui::eprintln_error(&err);
        std::process::exit(win11ready::exit::exit_code(&err));
    }
}
