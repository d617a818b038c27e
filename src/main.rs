use png_check::{check_png_bytes, TerminalState};

fn main() {
  env_logger::init();
  let path = match std::env::args().nth(1) {
    Some(path) => path,
    None => {
      println!(
        "\u{7}!!! ERROR !!! Please supply filename on the command line as first argument\n"
      );
      std::process::exit(1);
    }
  };
  println!("Input=[{path}]");
  let bytes = match std::fs::read(&path) {
    Ok(bytes) => bytes,
    Err(_) => {
      println!("\u{7}!!! ERROR !!! Can't open file!\n");
      std::process::exit(1);
    }
  };
  let outcome = check_png_bytes(&bytes);
  print!("{}", outcome.report);
  if outcome.state == TerminalState::Aborted {
    std::process::exit(1);
  }
}
