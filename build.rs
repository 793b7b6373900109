fn main() -> std::io::Result<()> {
    // The server half is only used by the mock runtime in tests.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/runtime/v1/api.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/runtime/v1/api.proto");

    Ok(())
}
