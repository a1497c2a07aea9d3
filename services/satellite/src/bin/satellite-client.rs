//! Satellite Client - queries a few points, then renders a whole area.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use satellite::client::{ClientConfig, MapCanvas, SatelliteProxy};
use satellite::geometry::{Area, Location};
use satellite::mtls::ClientCredentials;
use satellite::observability::{init_logging, LoggingConfig};
use tracing::info;

const PROBE_POINTS: [(i32, i32); 6] = [(1, 2), (30, 25), (50, 4), (0, 0), (50, 16), (10, 1)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("loading client configuration")?;

    init_logging(&LoggingConfig::client()).context("installing tracing subscriber")?;

    let credentials = ClientCredentials::load(&config.ca_cert, &config.client_cert, &config.client_key)
        .context("loading client TLS credentials")?;
    let proxy = SatelliteProxy::connect(&config, &credentials)?;

    let mut stdout = io::stdout();

    writeln!(stdout, "[*] gRPC single requests:")?;
    let points = PROBE_POINTS.iter().map(|&(x, y)| Location::new(x, y));
    for (loc, result) in proxy.get_points(points).await {
        match result {
            Ok(pixel) => writeln!(
                stdout,
                "\t(x: {}, y: {}): {:?}",
                loc.x,
                loc.y,
                char::from(pixel.value)
            )?,
            Err(err) => writeln!(stdout, "\t{loc}: {err}")?,
        }
    }

    pause(&mut stdout, "\n[I] Press <Enter> to continue...")?;
    write!(stdout, "\x1B[2J\x1B[1;1H")?;

    writeln!(stdout, "[*] gRPC server-stream request:")?;
    let width = i32::try_from(config.grid.width).context("map width")?;
    let height = i32::try_from(config.grid.height).context("map height")?;
    let area = Area::new(Location::new(0, 0), Location::new(width - 1, height - 1));

    let mut canvas = MapCanvas::new(config.grid);
    match proxy.stream_area(area).await {
        Ok(mut stream) => loop {
            match stream.next().await {
                Ok(Some(pixel)) => {
                    canvas.place(pixel, &mut stdout)?;
                }
                Ok(None) => break,
                Err(err) => {
                    writeln!(stdout, "\n[Error] {err}")?;
                    break;
                }
            }
        },
        Err(err) => writeln!(stdout, "\n[Error] {err}")?,
    }
    canvas.finish(&mut stdout)?;
    info!(pixels = canvas.placed(), rows = canvas.rows_rendered(), "Area stream finished");

    pause(&mut stdout, "\n[I] Press <Enter> to exit...")?;
    Ok(())
}

fn pause<W: Write>(out: &mut W, prompt: &str) -> io::Result<()> {
    writeln!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
