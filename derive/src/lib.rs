//! # conjure-derive
//!
//! Attribute macros that turn a function *signature* into an AI function.
//!
//! The annotated function has an empty body. Its name, doc comment, parameters and return type
//! are all the model gets to see; the macro replaces the body with a call to
//! `conjure::Function` (for `#[ai_fn]`) or renders the prompt without calling a model
//! (for `#[ai_prompt]`).
//!
//! ## Quick Start
//!
//! ```rust
//! use conjure::ai_fn;
//!
//! /// Return `n` fruits that are in season in the given month.
//! #[ai_fn]
//! pub async fn seasonal_fruits(month: String, n: u32) -> Vec<String> {}
//!
//! async fn demo(model: impl conjure::LanguageModel) -> conjure::Result<()> {
//!     let fruits = seasonal_fruits(&model, "July".into(), 3).await?;
//!     println!("{fruits:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Rendering the prompt only
//!
//! ```rust
//! use conjure::ai_prompt;
//!
//! #[ai_prompt(description = "Translate the text into French.")]
//! pub fn to_french(text: &str) -> String {}
//!
//! let prompt = to_french("good morning").unwrap();
//! assert_eq!(prompt.messages().len(), 2);
//! ```
//!
//! ## Requirements
//!
//! - The body must be empty (`{}`) or omitted (`;`)
//! - A return type is required; the generated function returns `conjure::Result<T>`
//! - Parameters must be plain identifiers whose types implement `serde::Serialize` and
//!   `schemars::JsonSchema`
//! - No `self` parameters, generics, or `impl Trait` parameters
//! - `#[ai_fn]` functions must be `async`; `#[ai_prompt]` functions must not be

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Expr, FnArg, ForeignItemFn, Ident, ItemFn, Lit, LitStr, Meta, Pat, ReturnType,
    Signature, Token, Type, Visibility,
    parse::{Parse, ParseStream, discouraged::Speculative},
    parse_macro_input,
};

/// Arguments accepted by both attributes.
struct FnArgs {
    description: Option<String>,
    rename: Option<String>,
    instructions: Option<String>,
}

impl Parse for FnArgs {
    /// Supports:
    /// - `description = "..."`: overrides the doc comment as the function description
    /// - `rename = "..."`: name shown to the model (defaults to the Rust name)
    /// - `instructions = "..."`: extra guidance appended to the prompt
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut description = None;
        let mut rename = None;
        let mut instructions = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            let _: Token![=] = input.parse()?;
            let value: LitStr = input.parse()?;

            match ident.to_string().as_str() {
                "description" => description = Some(value.value()),
                "rename" => rename = Some(value.value()),
                "instructions" => instructions = Some(value.value()),
                _ => {
                    return Err(syn::Error::new_spanned(
                        ident,
                        "unknown attribute. Supported: description, rename, instructions",
                    ));
                }
            }

            if input.peek(Token![,]) {
                let _: Token![,] = input.parse()?;
            }
        }

        Ok(Self {
            description,
            rename,
            instructions,
        })
    }
}

/// Either `fn f() -> T {}` or `fn f() -> T;`.
struct Declaration {
    attrs: Vec<Attribute>,
    vis: Visibility,
    sig: Signature,
}

impl Parse for Declaration {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let fork = input.fork();
        if let Ok(item) = fork.parse::<ItemFn>() {
            input.advance_to(&fork);
            if !item.block.stmts.is_empty() {
                return Err(syn::Error::new_spanned(
                    item.block,
                    "AI functions are declared with an empty body; the model provides the result",
                ));
            }
            return Ok(Self {
                attrs: item.attrs,
                vis: item.vis,
                sig: item.sig,
            });
        }

        let item: ForeignItemFn = input.parse()?;
        Ok(Self {
            attrs: item.attrs,
            vis: item.vis,
            sig: item.sig,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Function,
    Prompt,
}

/// Turns an empty async function into an AI function evaluated by a language model.
///
/// The generated function takes the model as an extra first parameter named `model` and
/// returns `conjure::Result<T>`, where `T` is the declared return type.
///
/// # Arguments
///
/// - `description` (optional): what the function does. Defaults to the doc comment; one of the
///   two is required.
/// - `rename` (optional): the name shown to the model.
/// - `instructions` (optional): extra guidance for the model.
///
/// # Example
///
/// ```rust
/// /// Rate the sentiment of the text from -1.0 (negative) to 1.0 (positive).
/// #[ai_fn]
/// pub async fn sentiment(text: String) -> f32 {}
///
/// // let score = sentiment(&model, "I love it".into()).await?;
/// ```
///
/// # Errors
///
/// Compile-time errors are produced if the function has a body, no return type, a `self`
/// parameter, generics, `impl Trait` or pattern parameters, a parameter named `model`, no
/// description, or is not `async`.
#[proc_macro_attribute]
pub fn ai_fn(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as FnArgs);
    let declaration = parse_macro_input!(input as Declaration);

    match expand(Kind::Function, args, declaration) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Turns an empty function into a prompt renderer.
///
/// The generated function keeps the declared parameters and returns
/// `conjure::Result<conjure::PromptFunction>`: the messages and response schema an AI function
/// would send, without calling any model.
///
/// Accepts the same arguments as [`macro@ai_fn`].
#[proc_macro_attribute]
pub fn ai_prompt(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as FnArgs);
    let declaration = parse_macro_input!(input as Declaration);

    match expand(Kind::Prompt, args, declaration) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A parameter of the declared function.
struct Param {
    ident: Ident,
    ty: Type,
}

fn expand(
    kind: Kind,
    args: FnArgs,
    declaration: Declaration,
) -> syn::Result<proc_macro2::TokenStream> {
    let Declaration { attrs, vis, sig } = declaration;
    let fn_ident = &sig.ident;

    match (kind, sig.asyncness.is_some()) {
        (Kind::Function, false) => {
            return Err(syn::Error::new_spanned(
                &sig.fn_token,
                "#[ai_fn] functions must be async",
            ));
        }
        (Kind::Prompt, true) => {
            return Err(syn::Error::new_spanned(
                sig.asyncness,
                "#[ai_prompt] functions render synchronously and must not be async",
            ));
        }
        _ => {}
    }

    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "generic AI functions are not supported",
        ));
    }

    let output = match &sig.output {
        ReturnType::Type(_, ty) => ty.as_ref().clone(),
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                &sig,
                "AI functions must declare a return type",
            ));
        }
    };

    let params = analyze_params(kind, &sig)?;

    let description = args
        .description
        .or_else(|| doc_comment(&attrs))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                fn_ident,
                "AI functions need a description: add a doc comment or `description = \"...\"`",
            )
        })?;
    let name = args.rename.unwrap_or_else(|| fn_ident.to_string());
    let instructions = args
        .instructions
        .map(|text| quote! { .instructions(#text) });

    let idents: Vec<&Ident> = params.iter().map(|param| &param.ident).collect();
    let names: Vec<String> = idents.iter().map(ToString::to_string).collect();
    let types: Vec<&Type> = params.iter().map(|param| &param.ty).collect();

    let arguments = quote! {
        let arguments = ::conjure::__hidden::Arguments::new()
            #( .with(#names, &#idents)? )*;
    };

    let expanded = match kind {
        Kind::Function => quote! {
            #(#attrs)*
            #vis async fn #fn_ident<__ConjureModel: ::conjure::LanguageModel>(
                model: &__ConjureModel,
                #( #idents: #types ),*
            ) -> ::conjure::Result<#output> {
                #arguments
                ::conjure::Function::<#output>::new(#name, #description)
                    #( .param::<#types>(#names) )*
                    #instructions
                    .call(model, arguments)
                    .await
            }
        },
        Kind::Prompt => quote! {
            #(#attrs)*
            #vis fn #fn_ident(
                #( #idents: #types ),*
            ) -> ::conjure::Result<::conjure::PromptFunction> {
                #arguments
                ::conjure::prompt_fn::<#output>(#name, #description)
                    #( .param::<#types>(#names) )*
                    #instructions
                    .render(arguments)
            }
        },
    };

    Ok(expanded)
}

/// Collects the declared parameters, rejecting shapes the generated code cannot forward.
fn analyze_params(kind: Kind, sig: &Signature) -> syn::Result<Vec<Param>> {
    let mut params = Vec::with_capacity(sig.inputs.len());

    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            return Err(syn::Error::new_spanned(
                input,
                "self parameters are not supported in AI functions",
            ));
        };

        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "AI function parameters must be plain identifiers",
            ));
        };
        if pat_ident.by_ref.is_some() || pat_ident.subpat.is_some() {
            return Err(syn::Error::new_spanned(
                pat_ident,
                "AI function parameters must be plain identifiers",
            ));
        }
        if kind == Kind::Function && pat_ident.ident == "model" {
            return Err(syn::Error::new_spanned(
                &pat_ident.ident,
                "`model` is reserved for the language model parameter added by #[ai_fn]",
            ));
        }
        if matches!(pat_type.ty.as_ref(), Type::ImplTrait(_)) {
            return Err(syn::Error::new_spanned(
                &pat_type.ty,
                "impl Trait parameters are not supported in AI functions",
            ));
        }

        params.push(Param {
            ident: pat_ident.ident.clone(),
            ty: pat_type.ty.as_ref().clone(),
        });
    }

    Ok(params)
}

/// Joins `///` lines into a single description.
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(text) => Some(text.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect();

    let joined = lines.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}
