fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Server and client share one proto: the server binary implements it,
    // the client binary and the in-process tests call it.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/satellite.proto"], &["proto"])?;

    Ok(())
}
