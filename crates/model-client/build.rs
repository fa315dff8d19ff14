fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Ensure a protoc binary is available even when the system package is
    // not installed, by pointing prost/tonic at the vendored compiler.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", protoc);
        }
    }

    // Compile the proto file for the model-inference service
    tonic_build::compile_protos("../../proto/inference.proto")?;
    Ok(())
}
