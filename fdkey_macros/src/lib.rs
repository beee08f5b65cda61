use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2, TokenTree};
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, Result as SynResult};

/// Functional dependencies written inline, one per `;`:
///
/// ```ignore
/// let deps = fdkey::fds! {
///     A -> B;
///     A, D -> E, F;
///     -> C;            // constant
///     "order id" -> "customer";
/// };
/// ```
///
/// Attributes are identifiers or string literals; the result is a
/// `Vec<fdkey::FunctionalDependency<String>>`.
#[proc_macro]
pub fn fds(input: TokenStream) -> TokenStream {
    let top = syn::parse_macro_input!(input as Top);
    match build(top.tokens) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

struct Top {
    tokens: TokenStream2,
}
impl Parse for Top {
    fn parse(input: ParseStream) -> SynResult<Self> {
        Ok(Self {
            tokens: input.parse()?,
        })
    }
}

#[derive(Debug)]
struct FdAst {
    lhs: Vec<String>,
    rhs: Vec<String>,
}

// -----------------------------
// Build
// -----------------------------

fn build(tokens: TokenStream2) -> SynResult<TokenStream2> {
    let toks: Vec<TokenTree> = tokens.into_iter().collect();
    let mut fds = vec![];
    for item in split_top_level(&toks, ';') {
        if item.is_empty() {
            continue;
        }
        fds.push(parse_fd(&item)?);
    }

    let exprs: Vec<TokenStream2> = fds.into_iter().map(fd_to_expr).collect();
    Ok(quote! {
        {
            let fds: ::std::vec::Vec<fdkey::FunctionalDependency<::std::string::String>> =
                ::std::vec![ #(#exprs),* ];
            fds
        }
    })
}

fn fd_to_expr(fd: FdAst) -> TokenStream2 {
    let lhs = fd.lhs;
    let rhs = fd.rhs;
    quote! {
        fdkey::FunctionalDependency::<::std::string::String>::new(
            [ #(#lhs.to_string()),* ],
            [ #(#rhs.to_string()),* ],
        )
    }
}

// -----------------------------
// Parse
// -----------------------------

fn parse_fd(item: &[TokenTree]) -> SynResult<FdAst> {
    let arrow = find_arrow(item).ok_or_else(|| {
        syn::Error::new(item[0].span(), "expected `lhs -> rhs`")
    })?;
    let lhs = parse_attr_list(&item[..arrow], true)?;
    let rhs = parse_attr_list(&item[arrow + 2..], false)?;
    Ok(FdAst { lhs, rhs })
}

/// Index of the `-` of the first `->`.
fn find_arrow(item: &[TokenTree]) -> Option<usize> {
    item.windows(2).position(|w| match (&w[0], &w[1]) {
        (TokenTree::Punct(a), TokenTree::Punct(b)) => a.as_char() == '-' && b.as_char() == '>',
        _ => false,
    })
}

fn parse_attr_list(tokens: &[TokenTree], allow_empty: bool) -> SynResult<Vec<String>> {
    if tokens.is_empty() && allow_empty {
        return Ok(vec![]);
    }
    let mut out = vec![];
    for part in split_top_level(tokens, ',') {
        match part.as_slice() {
            [TokenTree::Ident(id)] => out.push(id.to_string()),
            [TokenTree::Literal(l)] => out.push(parse_str_lit(l)?),
            [] => {
                return Err(syn::Error::new(
                    Span::call_site(),
                    "empty attribute in dependency",
                ))
            }
            [first, ..] => {
                return Err(syn::Error::new(
                    first.span(),
                    "expected an identifier or string literal",
                ))
            }
        }
    }
    Ok(out)
}

fn parse_str_lit(l: &proc_macro2::Literal) -> SynResult<String> {
    let lit: syn::LitStr = syn::parse2(TokenTree::Literal(l.clone()).into())
        .map_err(|_| syn::Error::new(l.span(), "attribute literals must be strings"))?;
    Ok(lit.value())
}

fn split_top_level(tokens: &[TokenTree], sep: char) -> Vec<Vec<TokenTree>> {
    let mut out = vec![];
    let mut cur = vec![];
    for tt in tokens {
        match tt {
            TokenTree::Punct(p) if p.as_char() == sep => {
                out.push(cur);
                cur = vec![];
            }
            _ => cur.push(tt.clone()),
        }
    }
    out.push(cur);
    out
}
