fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the bundled protoc unless the environment already names one.
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_build::configure()
        .build_client(false)
        .compile_protos(&["proto/vidspace.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/vidspace.proto");
    Ok(())
}
