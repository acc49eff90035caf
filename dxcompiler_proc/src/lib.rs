use proc_macro::TokenStream;
use proc_macro2::{Literal, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    Attribute, Ident, Result, Token, Type, braced, parenthesized,
    parse::{Parse, ParseStream},
    parse_macro_input,
    punctuated::Punctuated,
};

/// A single exported C function
struct Function {
    attrs: Vec<Attribute>,
    symbol: Ident,
    args: Vec<(Ident, Type)>,
    ret: Option<Type>,
}

/// The full native_api input
struct NativeApi {
    attrs: Vec<Attribute>,
    table_name: Ident,
    functions: Vec<Function>,
}

impl Parse for NativeApi {
    fn parse(input: ParseStream) -> Result<Self> {
        // Parse attributes (doc comments)
        let attrs = input.call(Attribute::parse_outer)?;

        // TableName { ... }
        let table_name: Ident = input.parse()?;

        let content;
        braced!(content in input);

        let mut functions = Vec::new();
        while !content.is_empty() {
            let fn_attrs = content.call(Attribute::parse_outer)?;

            // fn Symbol(args) [-> RetType];
            content.parse::<Token![fn]>()?;
            let symbol: Ident = content.parse()?;

            let args_content;
            parenthesized!(args_content in content);
            let args_parsed: Punctuated<(Ident, Type), Token![,]> = args_content.parse_terminated(
                |input| {
                    let name: Ident = input.parse()?;
                    input.parse::<Token![:]>()?;
                    let ty: Type = input.parse()?;
                    Ok((name, ty))
                },
                Token![,],
            )?;
            let args: Vec<_> = args_parsed.into_iter().collect();

            let ret = if content.peek(Token![->]) {
                content.parse::<Token![->]>()?;
                Some(content.parse::<Type>()?)
            } else {
                None
            };

            content.parse::<Token![;]>()?;

            functions.push(Function {
                attrs: fn_attrs,
                symbol,
                args,
                ret,
            });
        }

        if functions.is_empty() {
            return Err(syn::Error::new(
                table_name.span(),
                "native_api requires at least one function",
            ));
        }

        Ok(NativeApi {
            attrs,
            table_name,
            functions,
        })
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            // Keep acronyms together: "GetHLSL" -> "get_hlsl"
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && (!prev_upper || next_lower) {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

fn fn_pointer_type(function: &Function) -> TokenStream2 {
    let arg_types: Vec<_> = function.args.iter().map(|(_, ty)| ty).collect();
    match &function.ret {
        Some(ret) => quote! { unsafe extern "C" fn(#(#arg_types),*) -> #ret },
        None => quote! { unsafe extern "C" fn(#(#arg_types),*) },
    }
}

fn generate_field(function: &Function) -> TokenStream2 {
    let attrs = &function.attrs;
    let field = format_ident!("{}", to_snake_case(&function.symbol.to_string()));
    let ty = fn_pointer_type(function);

    quote! {
        #(#attrs)*
        pub #field: #ty
    }
}

fn generate_resolve(function: &Function) -> TokenStream2 {
    let field = format_ident!("{}", to_snake_case(&function.symbol.to_string()));
    let symbol = function.symbol.to_string();
    let symbol_nul = Literal::byte_string(format!("{}\0", symbol).as_bytes());
    let ty = fn_pointer_type(function);

    quote! {
        #field: {
            let name = unsafe { ::std::ffi::CStr::from_bytes_with_nul_unchecked(#symbol_nul) };
            let ptr = lookup(name);
            if ptr.is_null() {
                return Err(#symbol);
            }
            unsafe { ::std::mem::transmute::<*mut ::std::ffi::c_void, #ty>(ptr) }
        }
    }
}

/// Declares a table of C function pointers resolved by symbol name.
///
/// ```ignore
/// native_api! {
///     /// Functions exported by the shim
///     ShimApi {
///         fn CreateThing() -> *mut Thing;
///         fn DeleteThing(thing: *mut Thing);
///     }
/// }
/// ```
///
/// expands to a `Copy` struct with one `unsafe extern "C" fn` field per
/// function (named in snake case), a `SYMBOLS` list, and an `unsafe fn
/// resolve` that fills the table from a symbol lookup closure.
#[proc_macro]
pub fn native_api(input: TokenStream) -> TokenStream {
    let api = parse_macro_input!(input as NativeApi);

    let attrs = &api.attrs;
    let table_name = &api.table_name;

    let fields: Vec<_> = api.functions.iter().map(generate_field).collect();
    let resolvers: Vec<_> = api.functions.iter().map(generate_resolve).collect();
    let symbols: Vec<_> = api
        .functions
        .iter()
        .map(|f| f.symbol.to_string())
        .collect();

    let expanded = quote! {
        #(#attrs)*
        #[derive(Clone, Copy)]
        pub struct #table_name {
            #(#fields),*
        }

        impl #table_name {
            /// Names of every symbol this table resolves
            pub const SYMBOLS: &'static [&'static str] = &[#(#symbols),*];

            /// Resolves every function through `lookup`.
            ///
            /// Returns the name of the first symbol that resolved to null.
            ///
            /// # Safety
            /// Each non-null pointer returned by `lookup` must point to a
            /// function with exactly the declared C signature.
            pub unsafe fn resolve<F>(mut lookup: F) -> ::std::result::Result<Self, &'static str>
            where
                F: FnMut(&::std::ffi::CStr) -> *mut ::std::ffi::c_void,
            {
                Ok(#table_name {
                    #(#resolvers),*
                })
            }
        }

        impl ::std::fmt::Debug for #table_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!(#table_name))
                    .field("symbols", &Self::SYMBOLS.len())
                    .finish()
            }
        }
    };

    TokenStream::from(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("CreateCompilerInstance"), "create_compiler_instance");
        assert_eq!(to_snake_case("GetStatus"), "get_status");
        assert_eq!(to_snake_case("GetHLSLOutput"), "get_hlsl_output");
        assert_eq!(to_snake_case("Compile"), "compile");
    }

    #[test]
    fn test_parse_api() {
        let api: NativeApi = syn::parse_str(
            r#"
            /// Test table
            TestApi {
                fn Open(path: *const c_char) -> *mut c_void;
                fn Close(handle: *mut c_void);
            }
            "#,
        )
        .unwrap();

        assert_eq!(api.table_name, "TestApi");
        assert_eq!(api.functions.len(), 2);
        assert_eq!(api.functions[0].args.len(), 1);
        assert!(api.functions[0].ret.is_some());
        assert!(api.functions[1].ret.is_none());
    }

    #[test]
    fn test_empty_api_rejected() {
        let api = syn::parse_str::<NativeApi>("EmptyApi {}");
        assert!(api.is_err());
    }
}
