// `curl`-style options declared through field tags; `-H` is greedy.

use std::time::Duration;

use optflag::{BindFields, Binder, ErrorHandling, FlagSet, Result, Var};

#[derive(Default)]
struct Timeouts {
    connect: Var<Duration>,
    max_time: Var<Duration>,
}

impl BindFields for Timeouts {
    fn bind_fields(&self, b: &mut Binder<'_>) {
        b.field(
            &self.connect,
            r#"opt:"connect-timeout" defValue:"10s" usage:"maximum time allowed for connection""#,
        )
        .field(
            &self.max_time,
            r#"opt:"m, max-time" usage:"maximum time allowed for the transfer""#,
        );
    }
}

#[derive(Default)]
struct Options {
    headers: Var<Vec<String>>,
    url: Var<String>,
    method: Var<String>,
    data: Var<Vec<String>>,
    retries: Var<i64>,
    verbose: Var<bool>,
    timeouts: Timeouts,
}

impl BindFields for Options {
    fn bind_fields(&self, b: &mut Binder<'_>) {
        b.field(&self.headers, r#"opt:"H, header" flags:"greedy" usage:"pass custom header(s) to server""#)
            .field(&self.url, r#"opt:"url" usage:"URL to work with""#)
            .field(&self.method, r#"opt:"X, request" defValue:"GET" usage:"specify request command to use""#)
            .field(&self.data, r#"opt:"d, data" usage:"HTTP POST data""#)
            .field(&self.retries, r#"opt:"retry" defValue:"0" usage:"retry request if transient problems occur""#)
            .field(&self.verbose, r#"opt:"v, verbose" flags:"posix" usage:"make the operation more talkative""#)
            .group(&self.timeouts);
    }
}

fn main() {
    test_driver::init_tracing();
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut fs = FlagSet::new("curl", ErrorHandling::ExitOnError).version("v0.1.0");
    let options = Options::default();
    let args: Vec<String> = std::env::args().skip(1).collect();
    fs.parse_struct(&args, &options)?;

    println!("method={}", options.method.get());
    println!("url={}", options.url.get());
    println!("headers={:?}", options.headers.get());
    println!("data={:?}", options.data.get());
    println!("retry={}", options.retries.get());
    println!("verbose={}", options.verbose.get());
    println!("connect-timeout={:?}", options.timeouts.connect.get());
    println!("max-time={:?}", options.timeouts.max_time.get());
    println!("args={:?}", fs.args());
    Ok(())
}
