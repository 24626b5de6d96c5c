//! Offline converter: CSV pose log to sequential marker log

use clap::Parser;

use skelbridge_record::CsvConverter;
use skelbridge_runtime::{init_tracing, ConvertArgs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ConvertArgs::parse();
    init_tracing(args.log_format);

    if !args.input.is_file() {
        let message = format!("input file {} does not exist", args.input.display());
        tracing::error!("{}", message);
        return Err(message.into());
    }

    let output = args.output_path();
    tracing::info!(
        input = %args.input.display(),
        output = %output.display(),
        "converting"
    );

    let converter = CsvConverter::new(args.converter_config());
    if let Err(e) = converter.convert_file(&args.input, &output) {
        tracing::error!("conversion failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}
