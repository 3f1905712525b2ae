//! `protoc` plugin protocol.
//!
//! `protoc` hands the plugin a `CodeGeneratorRequest` and expects a
//! `CodeGeneratorResponse` back. Generation is all-or-nothing: every eligible
//! file is rendered in memory with one shared [`ErrorLog`], and if anything
//! was logged the whole run fails without producing a single file.

use crate::error::{ErrorLog, Result};
use crate::header::{HeaderFile, HeaderGenerator};
use prost::Message;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::FileDescriptorSet;
use tracing::{debug, info};

/// Parameter token asking the plugin to accept proto3 `optional` fields
pub const PROTO3_OPTIONAL_PARAMETER: &str = "experimental_allow_proto3_optional";

/// Returns true if `file_name` is one of the files `protoc` asked for
pub fn should_generate(request: &CodeGeneratorRequest, file_name: &str) -> bool {
    request.file_to_generate.iter().any(|f| f == file_name)
}

/// Returns true if the parameter string carries the proto3-optional token
pub fn supports_proto3_optional(parameter: &str) -> bool {
    parameter.contains(PROTO3_OPTIONAL_PARAMETER)
}

/// Renders every eligible file of the request.
///
/// Returns `Error::Generation` with all recorded diagnostics if any file
/// produced one; in that case none of the headers are returned.
pub fn generate_headers(
    request: &CodeGeneratorRequest,
    generator: &HeaderGenerator,
) -> Result<Vec<HeaderFile>> {
    let mut log = ErrorLog::new();
    let mut headers = Vec::new();

    for file in &request.proto_file {
        if !should_generate(request, file.name()) {
            debug!("Skipping {} (not requested)", file.name());
            continue;
        }
        headers.push(generator.generate(file, &mut log)?);
    }

    log.into_result()?;
    info!("Generated {} header(s)", headers.len());
    Ok(headers)
}

/// Builds the response for a set of generated headers
pub fn build_response(parameter: &str, headers: Vec<HeaderFile>) -> CodeGeneratorResponse {
    let supported_features = if supports_proto3_optional(parameter) {
        Some(Feature::Proto3Optional as u64)
    } else {
        None
    };

    CodeGeneratorResponse {
        supported_features,
        file: headers
            .into_iter()
            .map(|header| File {
                name: Some(header.name),
                content: Some(header.content),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// Runs a full request through the generator
pub fn generate(
    request: &CodeGeneratorRequest,
    generator: &HeaderGenerator,
) -> Result<CodeGeneratorResponse> {
    let headers = generate_headers(request, generator)?;
    Ok(build_response(request.parameter(), headers))
}

/// Decodes a serialized `CodeGeneratorRequest`
pub fn decode_request(data: &[u8]) -> Result<CodeGeneratorRequest> {
    Ok(CodeGeneratorRequest::decode(data)?)
}

/// Serializes a `CodeGeneratorResponse`
pub fn encode_response(response: &CodeGeneratorResponse) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(response.encoded_len());
    response.encode(&mut buf)?;
    Ok(buf)
}

/// Builds a request from a serialized `FileDescriptorSet`, as written by
/// `protoc --descriptor_set_out`.
///
/// With an empty `files_to_generate` every file in the set is requested.
pub fn request_from_descriptor_set(
    data: &[u8],
    files_to_generate: &[String],
    parameter: Option<&str>,
) -> Result<CodeGeneratorRequest> {
    let set = FileDescriptorSet::decode(data)?;

    let file_to_generate = if files_to_generate.is_empty() {
        set.file.iter().map(|f| f.name().to_string()).collect()
    } else {
        files_to_generate.to_vec()
    };

    Ok(CodeGeneratorRequest {
        file_to_generate,
        parameter: parameter.map(str::to_string),
        proto_file: set.file,
        ..Default::default()
    })
}
