//! Attribute macro that substitutes every occurrence of an identifier within
//! the item it is applied to.
//!
//! # Usage
//! [`replace`] takes the ident to search for and the tokens to put in its
//! place:
//! ```
//! # use tokenreplace::replace;
//! # struct Window { blocks: usize, block_size: usize }
//! #[replace(blocks, block_size)]
//! fn blocks(window: &Window) -> usize {
//!   window.blocks
//! }
//! # let window = Window { blocks: 1, block_size: 8 };
//! # assert_eq!(block_size(&window), 8);
//! ```
//! expands to
//! ```
//! # struct Window { blocks: usize, block_size: usize }
//! fn block_size(window: &Window) -> usize {
//!   window.block_size
//! }
//! ```
//!
//! # Why it exists
//! The `metrics::metric!` macro registers each metric in a [linkme]
//! distributed slice. The code linkme generates refers to itself as
//! `linkme::...`, which only resolves in crates that depend on linkme
//! directly. `metric!` attaches
//! ```text
//! #[metrics::export::replace(linkme, metrics::export::linkme)]
//! ```
//! to the registered static so the generated paths point at the copy of
//! linkme re-exported by the metrics crate instead. Since `$crate` cannot be
//! used inside the replacement the crate name is written out literally.
//!
//! [`replace`]: macro@crate::replace
//! [linkme]: https://docs.rs/linkme

extern crate proc_macro;

use proc_macro2::{Group, TokenStream, TokenTree};
use quote::ToTokens;
use syn::parse::{Parse, ParseStream};
use syn::Token;

/// Parsed `search, replacement...` attribute arguments.
struct Replacer {
  search: syn::Ident,
  replacement: TokenStream,
}

impl Parse for Replacer {
  fn parse(input: ParseStream) -> syn::parse::Result<Self> {
    let search = input.parse()?;
    let _: Token![,] = input.parse()?;
    let replacement = input.parse()?;

    Ok(Self { search, replacement })
  }
}

impl Replacer {
  fn stream(&self, stream: TokenStream, out: &mut TokenStream) {
    for tree in stream {
      self.tree(tree, out);
    }
  }

  fn tree(&self, tree: TokenTree, out: &mut TokenStream) {
    match tree {
      TokenTree::Group(group) => {
        let mut inner = TokenStream::new();
        self.stream(group.stream(), &mut inner);

        let mut replaced = Group::new(group.delimiter(), inner);
        replaced.set_span(group.span());
        replaced.to_tokens(out);
      }
      TokenTree::Ident(ident) if ident == self.search => {
        self.replacement.to_tokens(out);
      }
      other => other.to_tokens(out),
    }
  }
}

fn token_replace(attr: TokenStream, input: TokenStream) -> TokenStream {
  let replacer: Replacer = match syn::parse2(attr) {
    Ok(replacer) => replacer,
    Err(e) => return e.to_compile_error(),
  };

  let mut output = TokenStream::new();
  replacer.stream(input, &mut output);
  output
}

#[proc_macro_attribute]
pub fn replace(
  attr: proc_macro::TokenStream,
  item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
  token_replace(attr.into(), item.into()).into()
}
