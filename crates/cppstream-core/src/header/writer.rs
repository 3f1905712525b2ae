//! Text emission for C++ stream headers.

use super::{HeaderConfig, HeaderStats, GENERATE_REFLECTION_TABLES, GENERATOR_NAME};
use crate::error::ErrorLog;
use crate::field_id::{FieldCount, FieldId, FieldType};
use crate::naming::{make_constant_name, split, strip_prefix};
use prost_types::field_descriptor_proto::Label;
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};
use std::fmt::{Result, Write as FmtWrite};
use tracing::trace;

/// Pending work while walking a message tree.
///
/// `Open` writes everything up to and including the nested enums, then
/// pushes the matching `Close` below the nested messages so it runs once
/// they are all done. `Close` writes the fields, the tables and the brace.
enum Step<'m> {
    Open {
        message: &'m DescriptorProto,
        depth: usize,
        path: String,
    },
    Close {
        message: &'m DescriptorProto,
        depth: usize,
        path: String,
    },
}

/// Writes one header into a `fmt::Write` sink
pub(super) struct HeaderWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a HeaderConfig,
    log: &'a mut ErrorLog,
    file_name: &'a str,
    indent_level: usize,
    stats: HeaderStats,
}

impl<'a, W: FmtWrite> HeaderWriter<'a, W> {
    pub(super) fn new(
        writer: &'a mut W,
        config: &'a HeaderConfig,
        log: &'a mut ErrorLog,
        file_name: &'a str,
    ) -> Self {
        Self {
            writer,
            config,
            log,
            file_name,
            indent_level: 0,
            stats: HeaderStats::default(),
        }
    }

    pub(super) fn stats(&self) -> HeaderStats {
        self.stats
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) -> Result {
        for _ in 0..self.indent_level {
            write!(self.writer, "{}", self.config.indent_str)?;
        }
        Ok(())
    }

    fn writeln(&mut self, s: &str) -> Result {
        self.write_indent()?;
        writeln!(self.writer, "{}", s)
    }

    pub(super) fn write_file(&mut self, file: &FileDescriptorProto, guard: &str) -> Result {
        writeln!(self.writer, "// Generated by {}. DO NOT MODIFY.", GENERATOR_NAME)?;
        writeln!(self.writer, "// source: {}", file.name())?;
        writeln!(self.writer)?;

        writeln!(self.writer, "#ifndef {}", guard)?;
        writeln!(self.writer, "#define {}", guard)?;
        writeln!(self.writer)?;

        let namespaces = split(file.package(), '.');
        for namespace in &namespaces {
            writeln!(self.writer, "namespace {} {{", namespace)?;
        }
        writeln!(self.writer)?;

        for enum_type in &file.enum_type {
            self.write_enum(enum_type)?;
        }

        for message in &file.message_type {
            self.write_message(message, file.package())?;
        }

        for namespace in namespaces.iter().rev() {
            writeln!(self.writer, "}} // {}", namespace)?;
        }
        writeln!(self.writer)?;

        writeln!(self.writer, "#endif // {}", guard)
    }

    fn write_enum(&mut self, enum_type: &EnumDescriptorProto) -> Result {
        self.stats.enums += 1;
        self.write_indent()?;
        writeln!(self.writer, "// enum {}", enum_type.name())?;

        for value in &enum_type.value {
            self.write_indent()?;
            writeln!(
                self.writer,
                "const int {} = {};",
                make_constant_name(value.name()),
                value.number()
            )?;
        }

        if GENERATE_REFLECTION_TABLES {
            self.write_enum_tables(enum_type)?;
        }

        writeln!(self.writer)
    }

    fn write_enum_tables(&mut self, enum_type: &EnumDescriptorProto) -> Result {
        let count = enum_type.value.len();
        let name = make_constant_name(enum_type.name());
        let prefix = format!("{}_", name);

        self.write_indent()?;
        writeln!(self.writer, "static const int _ENUM_{}_COUNT = {};", name, count)?;

        self.write_indent()?;
        writeln!(self.writer, "static const char* _ENUM_{}_NAMES[{}] = {{", name, count)?;
        self.indent();
        for value in &enum_type.value {
            self.write_indent()?;
            writeln!(self.writer, "\"{}\",", strip_prefix(value.name(), &prefix))?;
        }
        self.dedent();
        self.writeln("};")?;

        self.write_indent()?;
        writeln!(self.writer, "static const int _ENUM_{}_VALUES[{}] = {{", name, count)?;
        self.indent();
        for value in &enum_type.value {
            self.write_indent()?;
            writeln!(self.writer, "{},", make_constant_name(value.name()))?;
        }
        self.dedent();
        self.writeln("};")
    }

    /// Writes a message and everything nested in it.
    ///
    /// Nesting depth comes straight from the input, so the tree is walked
    /// with an explicit stack rather than by recursion.
    fn write_message(&mut self, root: &DescriptorProto, scope: &str) -> Result {
        let mut stack = vec![Step::Open {
            message: root,
            depth: self.indent_level,
            path: qualify(scope, root.name()),
        }];

        while let Some(step) = stack.pop() {
            match step {
                Step::Open {
                    message,
                    depth,
                    path,
                } => {
                    trace!("Writing message {}", path);
                    self.stats.messages += 1;
                    self.indent_level = depth;

                    self.write_indent()?;
                    writeln!(self.writer, "// message {}", message.name())?;
                    self.write_indent()?;
                    writeln!(self.writer, "namespace {} {{", message.name())?;

                    self.indent_level = depth + 1;
                    for enum_type in &message.enum_type {
                        self.write_enum(enum_type)?;
                    }

                    let nested: Vec<Step<'_>> = message
                        .nested_type
                        .iter()
                        .rev()
                        .map(|nested| Step::Open {
                            message: nested,
                            depth: depth + 1,
                            path: qualify(&path, nested.name()),
                        })
                        .collect();

                    stack.push(Step::Close {
                        message,
                        depth,
                        path,
                    });
                    stack.extend(nested);
                }
                Step::Close {
                    message,
                    depth,
                    path,
                } => {
                    self.indent_level = depth + 1;
                    for field in &message.field {
                        self.write_field(field, &path)?;
                    }

                    if GENERATE_REFLECTION_TABLES {
                        self.write_field_tables(message)?;
                    }

                    self.indent_level = depth;
                    self.write_indent()?;
                    writeln!(self.writer, "}} //{}", message.name())?;
                    writeln!(self.writer)?;
                }
            }
        }

        Ok(())
    }

    fn write_field(&mut self, field: &FieldDescriptorProto, scope: &str) -> Result {
        self.stats.fields += 1;

        let label = match field.label() {
            Label::Optional => "optional ",
            Label::Repeated => "repeated ",
            Label::Required => "",
        };
        let packed = if FieldCount::of(field) == FieldCount::Packed {
            " [packed=true]"
        } else {
            ""
        };

        self.write_indent()?;
        writeln!(
            self.writer,
            "// {}{} {} = {}{};",
            label,
            proto_type_name(field),
            field.name(),
            field.number(),
            packed
        )?;

        match FieldId::for_field(field) {
            Some(id) => {
                self.write_indent()?;
                writeln!(
                    self.writer,
                    "const uint64_t {} = {};",
                    make_constant_name(field.name()),
                    id
                )?;
            }
            None => {
                let raw = field
                    .r#type
                    .map_or_else(|| "missing".to_string(), |t| t.to_string());
                self.log.add(
                    self.file_name,
                    qualify(scope, field.name()),
                    format!("unknown field type ({})", raw),
                );
            }
        }

        writeln!(self.writer)
    }

    fn write_field_tables(&mut self, message: &DescriptorProto) -> Result {
        let count = message.field.len();

        self.write_indent()?;
        writeln!(self.writer, "static const int _FIELD_COUNT = {};", count)?;

        self.write_indent()?;
        writeln!(self.writer, "static const char* _FIELD_NAMES[{}] = {{", count)?;
        self.indent();
        for field in &message.field {
            self.write_indent()?;
            writeln!(self.writer, "\"{}\",", field.name())?;
        }
        self.dedent();
        self.writeln("};")?;

        self.write_indent()?;
        writeln!(self.writer, "static const uint64_t _FIELD_IDS[{}] = {{", count)?;
        self.indent();
        for field in &message.field {
            self.write_indent()?;
            writeln!(self.writer, "{},", make_constant_name(field.name()))?;
        }
        self.dedent();
        self.writeln("};")?;
        writeln!(self.writer)
    }
}

/// Type as shown in field comments: the keyword for scalars, the fully
/// qualified name for messages and enums
fn proto_type_name(field: &FieldDescriptorProto) -> String {
    match FieldType::of(field) {
        Some(FieldType::Message) | Some(FieldType::Enum) => field.type_name().to_string(),
        Some(FieldType::Group) => format!("group<{}>", field.type_name()),
        Some(scalar) => scalar.as_str().to_string(),
        None => "unknown".to_string(),
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}
