use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tracker-server-rs",
    version,
    about = "GPS unit tracking API server"
)]
pub struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 1337)]
    pub port: u16,
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}
