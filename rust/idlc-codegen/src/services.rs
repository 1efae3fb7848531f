//! Service emission.
//!
//! A service becomes a trait with one `&mut self` method per operation, a
//! stateless call unit per operation that owns request encoding and reply
//! decoding, an error enum per operation that declares exceptions, and a
//! blocking client implementing the trait (and every ancestor trait) over
//! `ClientBase`.

use codegen::{Block, Function, Scope};
use idlc_schema::{Field, ServiceId, ServiceMethod, ServiceType};

use crate::code_writer::CodeWriter;
use crate::codec::{Access, CodecGenerator, ReadField, Sink, WriteField};
use crate::constants::ConstantRenderer;
use crate::cw_writeln;
use crate::error::GenError;
use crate::naming;
use crate::reachability::is_allow_listed;
use crate::types::TypeMapper;

struct Param<'m> {
    field: &'m Field,
    ident: String,
    value_type: String,
    /// Passed and stored as `Option<_>`.
    optional: bool,
    default: Option<String>,
}

impl Param<'_> {
    fn declared_type(&self) -> String {
        if self.optional {
            format!("Option<{}>", self.value_type)
        } else {
            self.value_type.clone()
        }
    }
}

pub struct ServiceEmitter<'a> {
    mapper: &'a TypeMapper<'a>,
    allow_list: Option<&'a str>,
}

impl<'a> ServiceEmitter<'a> {
    /// Emits every operation.
    pub fn new(mapper: &'a TypeMapper<'a>) -> Self {
        Self {
            mapper,
            allow_list: None,
        }
    }

    /// Emits only operations carrying `annotation_key`.
    pub fn pruned(mapper: &'a TypeMapper<'a>, annotation_key: &'a str) -> Self {
        Self {
            mapper,
            allow_list: Some(annotation_key),
        }
    }

    fn rt(&self) -> &'a str {
        self.mapper.config().runtime_path()
    }

    fn methods<'s>(&self, service: &'s ServiceType) -> impl Iterator<Item = &'s ServiceMethod> + use<'s, 'a> {
        let allow_list = self.allow_list;
        service
            .methods
            .iter()
            .filter(move |method| allow_list.is_none_or(|key| is_allow_listed(method, key)))
    }

    pub fn generate(&self, id: ServiceId) -> Result<String, GenError> {
        let schema = self.mapper.schema();
        let service = schema.service(id);

        let mut scope = Scope::new();
        scope.raw(self.trait_definition(service)?.trim_end());
        for method in self.methods(service) {
            self.call_unit(&mut scope, service, method)?;
        }
        self.client(&mut scope, id)?;
        Ok(scope.to_string())
    }

    fn params<'m>(&self, method: &'m ServiceMethod) -> Result<Vec<Param<'m>>, GenError> {
        let constants = ConstantRenderer::new(self.mapper);
        method
            .parameters
            .iter()
            .map(|field| {
                let default = field
                    .default_value
                    .as_ref()
                    .map(|value| constants.render(&field.ty, value))
                    .transpose()?;
                Ok(Param {
                    field,
                    ident: naming::field_ident(self.mapper.config(), &field.name),
                    value_type: self.mapper.rust_type(&field.ty)?,
                    optional: !field.is_required() || default.is_some(),
                    default,
                })
            })
            .collect()
    }

    fn output_type(&self, method: &ServiceMethod) -> Result<String, GenError> {
        self.mapper.rust_type(&method.return_type)
    }

    /// The per-operation error type: a generated enum, or `Never`.
    fn error_type(&self, service: &ServiceType, method: &ServiceMethod) -> String {
        if method.exceptions.is_empty() {
            format!("{}::Never", self.rt())
        } else {
            naming::qualified(
                self.mapper.config(),
                &service.namespace,
                &format!("{}Error", naming::operation_type_name(&service.name, &method.name)),
            )
        }
    }

    fn call_name(&self, service: &ServiceType, method: &ServiceMethod) -> String {
        naming::qualified(
            self.mapper.config(),
            &service.namespace,
            &format!("{}Call", naming::operation_type_name(&service.name, &method.name)),
        )
    }

    fn return_type(&self, service: &ServiceType, method: &ServiceMethod) -> Result<String, GenError> {
        Ok(format!(
            "Result<{}, {}::CallError<{}>>",
            self.output_type(method)?,
            self.rt(),
            self.error_type(service, method)
        ))
    }

    fn trait_definition(&self, service: &ServiceType) -> Result<String, GenError> {
        let schema = self.mapper.schema();
        let name = naming::type_ident(&service.name);
        let header = match service.extends {
            Some(parent) => {
                let parent = schema.service(parent);
                format!(
                    "pub trait {name}: {}",
                    naming::qualified(self.mapper.config(), &parent.namespace, &parent.name)
                )
            }
            None => format!("pub trait {name}"),
        };

        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            if let Some(doc) = &service.documentation {
                w.doc(doc)?;
            }
            if service.deprecated {
                w.attribute("deprecated")?;
            }
            w.writeln(&format!("{header} {{"))?;
            {
                let _indent = w.indent();
                for (index, method) in self.methods(service).enumerate() {
                    if index > 0 {
                        w.blank_line()?;
                    }
                    if let Some(doc) = &method.documentation {
                        w.doc(doc)?;
                    }
                    if method.deprecated {
                        w.attribute("deprecated")?;
                    }
                    let params: Vec<String> = self
                        .params(method)?
                        .iter()
                        .map(|p| format!(", {}: {}", p.ident, p.declared_type()))
                        .collect();
                    cw_writeln!(
                        w,
                        "fn {}(&mut self{}) -> {};",
                        naming::method_ident(&method.name),
                        params.concat(),
                        self.return_type(service, method)?
                    )?;
                }
            }
            w.writeln("}")?;
        }
        Ok(out)
    }

    fn call_unit(&self, scope: &mut Scope, service: &ServiceType, method: &ServiceMethod) -> Result<(), GenError> {
        let rt = self.rt();
        let base = naming::operation_type_name(&service.name, &method.name);
        let call = format!("{base}Call");
        let params = self.params(method)?;
        let codec = CodecGenerator::new(self.mapper);

        let mut definition = String::new();
        {
            let mut w = CodeWriter::new(&mut definition);
            w.doc(&format!(
                "Request encoding and reply decoding for `{}.{}`.",
                service.name, method.name
            ))?;
            w.attribute("derive(Clone)")?;
            w.block(&format!("pub struct {call}"), |w| {
                for param in &params {
                    cw_writeln!(w, "{}: {},", param.ident, param.declared_type())?;
                }
                Ok(())
            })?;
        }
        scope.raw(definition.trim_end());

        let ctor = scope.new_impl(&call).new_fn("new").vis("pub").ret("Self");
        for param in &params {
            ctor.arg(&param.ident, param.declared_type());
        }
        let mut init = Block::new("Self");
        for param in &params {
            match &param.default {
                Some(default) => init.line(format!(
                    "{0}: {0}.or_else(|| Some({default})),",
                    param.ident
                )),
                None => init.line(format!("{},", param.ident)),
            };
        }
        ctor.push_block(init);

        let writes: Vec<WriteField<'_>> = params
            .iter()
            .map(|param| WriteField {
                field: param.field,
                access: if param.optional {
                    Access::Maybe(format!("self.{}.as_ref()", param.ident))
                } else {
                    Access::Present(format!("&self.{}", param.ident))
                },
            })
            .collect();

        let output = self.output_type(method)?;
        let error = self.error_type(service, method);

        let send = scope.new_impl(&call);
        send.impl_trait(format!("{rt}::MethodCall"));
        send.associate_type("Output", output.as_str());
        send.associate_type("Error", error.as_str());
        send.new_fn("name")
            .arg_ref_self()
            .ret("&'static str")
            .line(format!("{:?}", method.name));
        send.new_fn("message_type")
            .arg_ref_self()
            .ret(format!("{rt}::MessageType"))
            .line(format!(
                "{rt}::MessageType::{}",
                if method.one_way { "Oneway" } else { "Call" }
            ));
        send.new_fn("send")
            .arg_ref_self()
            .arg("protocol", format!("&mut dyn {rt}::Protocol"))
            .ret(format!("Result<(), {rt}::ProtocolError>"))
            .line(codec.write_struct("args", &writes)?.trim_end());

        if !method.one_way {
            let receive = self.receive_body(service, method, &codec)?;
            scope
                .new_impl(&call)
                .impl_trait(format!("{rt}::TwoWayCall"))
                .new_fn("receive")
                .arg_ref_self()
                .arg("protocol", format!("&mut dyn {rt}::Protocol"))
                .arg("_metadata", format!("&{rt}::MessageMetadata"))
                .ret(format!("Result<{output}, {rt}::CallError<{error}>>"))
                .line(receive.trim_end());
        }

        if !method.exceptions.is_empty() {
            self.error_enum(scope, service, method, &base)?;
        }
        Ok(())
    }

    fn receive_body(
        &self,
        service: &ServiceType,
        method: &ServiceMethod,
        codec: &CodecGenerator<'_>,
    ) -> Result<String, GenError> {
        let rt = self.rt();
        let returns_value = !self.mapper.schema().true_type(&method.return_type)?.is_void();

        let mut reads = Vec::new();
        let mut out = String::new();
        {
            let mut w = CodeWriter::new(&mut out);
            if returns_value {
                cw_writeln!(w, "let mut result: Option<{}> = None;", self.output_type(method)?)?;
                reads.push(ReadField {
                    id: 0,
                    ty: &method.return_type,
                    sink: Sink::Local("result".into()),
                });
            }
            for (index, exception) in method.exceptions.iter().enumerate() {
                cw_writeln!(
                    w,
                    "let mut exception{index}: Option<{}> = None;",
                    self.mapper.rust_type(&exception.ty)?
                )?;
                reads.push(ReadField {
                    id: exception.id,
                    ty: &exception.ty,
                    sink: Sink::Local(format!("exception{index}")),
                });
            }
            w.lines(&codec.read_loop(&reads)?)?;

            if returns_value {
                w.block("if let Some(result) = result", |w| w.writeln("return Ok(result);"))?;
            }
            let error = self.error_type(service, method);
            for (index, exception) in method.exceptions.iter().enumerate() {
                w.block(&format!("if let Some(exception) = exception{index}"), |w| {
                    cw_writeln!(
                        w,
                        "return Err({rt}::CallError::Exception({error}::{}(exception)));",
                        naming::variant_ident(&exception.name)
                    )
                })?;
            }
            if returns_value {
                cw_writeln!(w, "Err({rt}::CallError::MissingResult)")?;
            } else {
                w.writeln("Ok(())")?;
            }
        }
        Ok(out)
    }

    fn error_enum(
        &self,
        scope: &mut Scope,
        service: &ServiceType,
        method: &ServiceMethod,
        base: &str,
    ) -> Result<(), GenError> {
        let name = format!("{base}Error");

        let mut definition = String::new();
        {
            let mut w = CodeWriter::new(&mut definition);
            w.doc(&format!(
                "Exceptions declared by `{}.{}`.",
                service.name, method.name
            ))?;
            w.attribute("derive(Debug, Clone, PartialEq, Eq)")?;
            w.writeln(&format!("pub enum {name} {{"))?;
            {
                let _indent = w.indent();
                for exception in &method.exceptions {
                    cw_writeln!(
                        w,
                        "{}({}),",
                        naming::variant_ident(&exception.name),
                        self.mapper.rust_type(&exception.ty)?
                    )?;
                }
            }
            w.writeln("}")?;
        }
        scope.raw(definition.trim_end());

        let mut arms = Block::new("match self");
        for exception in &method.exceptions {
            arms.line(format!(
                "{name}::{}(exception) => ::std::fmt::Display::fmt(exception, f),",
                naming::variant_ident(&exception.name)
            ));
        }
        scope
            .new_impl(&name)
            .impl_trait("::std::fmt::Display")
            .new_fn("fmt")
            .arg_ref_self()
            .arg("f", "&mut ::std::fmt::Formatter<'_>")
            .ret("::std::fmt::Result")
            .push_block(arms);

        scope.new_impl(&name).impl_trait("::std::error::Error");
        Ok(())
    }

    fn client(&self, scope: &mut Scope, id: ServiceId) -> Result<(), GenError> {
        let rt = self.rt();
        let config = self.mapper.config();
        let schema = self.mapper.schema();
        let service = schema.service(id);
        let client = format!("{}Client", naming::bare(&naming::type_ident(&service.name)));
        let parent_client = service.extends.map(|parent| {
            let parent = schema.service(parent);
            naming::qualified(config, &parent.namespace, &format!("{}Client", parent.name))
        });

        let mut definition = String::new();
        {
            let mut w = CodeWriter::new(&mut definition);
            w.doc(&format!(
                "Blocking client for [`{}`] over any `Protocol`.",
                naming::bare(&naming::type_ident(&service.name))
            ))?;
            w.block(&format!("pub struct {client}<P>"), |w| match &parent_client {
                Some(parent) => cw_writeln!(w, "parent: {parent}<P>,"),
                None => cw_writeln!(w, "base: {rt}::ClientBase<P>,"),
            })?;
        }
        scope.raw(definition.trim_end());

        let inherent = scope.new_impl(&client);
        inherent.generic("P").target_generic("P").bound("P", format!("{rt}::Protocol"));
        let (new_body, base_body, into_body) = match &parent_client {
            Some(parent) => (
                format!("Self {{ parent: {parent}::new(protocol) }}"),
                "self.parent.base_mut()".to_string(),
                "self.parent.into_protocol()".to_string(),
            ),
            None => (
                format!("Self {{ base: {rt}::ClientBase::new(protocol) }}"),
                "&mut self.base".to_string(),
                "self.base.into_protocol()".to_string(),
            ),
        };
        inherent
            .new_fn("new")
            .vis("pub")
            .arg("protocol", "P")
            .ret("Self")
            .line(new_body);
        inherent
            .new_fn("base_mut")
            .vis("pub")
            .arg_mut_self()
            .ret(format!("&mut {rt}::ClientBase<P>"))
            .line(base_body);
        inherent
            .new_fn("into_protocol")
            .vis("pub")
            .arg_self()
            .ret("P")
            .line(into_body);

        for (depth, ancestor_id) in schema.service_chain(id).into_iter().enumerate() {
            let ancestor = schema.service(ancestor_id);
            let trait_path = naming::qualified(config, &ancestor.namespace, &ancestor.name);
            let imp = scope.new_impl(&client);
            imp.generic("P")
                .target_generic("P")
                .impl_trait(trait_path.as_str())
                .bound("P", format!("{rt}::Protocol"));

            for method in self.methods(ancestor) {
                let params = self.params(method)?;
                let function = imp.new_fn(&naming::method_ident(&method.name));
                self.signature(function, ancestor, method, &params)?;
                let args: Vec<&str> = params.iter().map(|p| p.ident.as_str()).collect();
                let args = args.join(", ");

                if depth > 0 {
                    function.line(format!(
                        "{trait_path}::{}(&mut self.parent{}{args})",
                        naming::method_ident(&method.name),
                        if args.is_empty() { "" } else { ", " }
                    ));
                } else if method.one_way {
                    function.line(format!(
                        "self.base_mut().send_oneway(&{}::new({args}))?;",
                        self.call_name(ancestor, method)
                    ));
                    function.line("Ok(())");
                } else {
                    function.line(format!(
                        "self.base_mut().call(&{}::new({args}))",
                        self.call_name(ancestor, method)
                    ));
                }
            }
        }
        Ok(())
    }

    fn signature(
        &self,
        function: &mut Function,
        service: &ServiceType,
        method: &ServiceMethod,
        params: &[Param<'_>],
    ) -> Result<(), GenError> {
        function.arg_mut_self();
        for param in params {
            function.arg(&param.ident, param.declared_type());
        }
        function.ret(self.return_type(service, method)?);
        Ok(())
    }
}
