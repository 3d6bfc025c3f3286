//! Build byte-alphabet NFAs from compiled PCRE byte-code and simulate them.
//!
//! The pipeline has three stages. A pattern arrives as a regex literal in the
//! optional `/pattern/flags` form; the flags after the final `/` become an
//! [`Options`] list. An external byte-code producer (anything implementing
//! [`CompilePcre`], typically a binding to a real PCRE library) turns the
//! pattern plus the recognized option bits into byte-code over the
//! [`bytecode::Opcode`] table. Finally the builder walks that byte-code,
//! Thompson-style, into an [`Nfa`] whose start state carries a self-loop over
//! every byte, so that matching behaves like an unanchored search unless the
//! pattern is anchored.
//!
//! The automaton is pure-acceptance: greedy, minimal, and possessive
//! quantifiers collapse to the same graph, and capture groups are recognized
//! structurally but not tracked.

#![deny(missing_docs, missing_debug_implementations)]

pub use crate::{
    bytecode::{Assembler, CompilePcre},
    error::BuildError,
    nfa::{EPSILON, Nfa, StateId},
    options::Options,
};

pub mod bytecode;
mod compile;
mod error;
mod nfa;
mod options;

/// Knobs for NFA construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    stats: Option<bool>,
    unanchored_prefix: Option<bool>,
}

impl Config {
    /// Create a new configuration with every knob at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotate states with shortest-path depth slots during construction.
    ///
    /// Depth is heavy (it enables [`Nfa::calculate_depth`] and the bookkeeping
    /// behind it) and is not needed for plain matching, so it defaults to
    /// `false`. The choice is fixed for the lifetime of the built automaton.
    pub fn stats(mut self, yes: bool) -> Self {
        self.stats = Some(yes);
        self
    }

    /// Return whether depth statistics are enabled.
    pub fn get_stats(&self) -> bool {
        self.stats.unwrap_or(false)
    }

    /// Seed the start state with a self-loop on every byte, implementing an
    /// implicit `.*?` search prefix. Defaults to `true`.
    ///
    /// An anchor opcode in the byte-code removes the loop again regardless of
    /// this setting.
    pub fn unanchored_prefix(mut self, yes: bool) -> Self {
        self.unanchored_prefix = Some(yes);
        self
    }

    /// Return whether the start state is seeded with the search self-loop.
    pub fn get_unanchored_prefix(&self) -> bool {
        self.unanchored_prefix.unwrap_or(true)
    }

    fn overwrite(self, other: Self) -> Self {
        Self {
            stats: other.stats.or(self.stats),
            unanchored_prefix: other.unanchored_prefix.or(self.unanchored_prefix),
        }
    }
}

/// Builds [`Nfa`]s from regex literals, using an external byte-code compiler.
#[derive(Debug, Clone)]
pub struct Builder<C> {
    config: Config,
    compiler: C,
}

impl<C: CompilePcre> Builder<C> {
    /// Create a builder around the given byte-code compiler, with the default
    /// configuration.
    pub fn new(compiler: C) -> Builder<C> {
        Builder {
            config: Config::default(),
            compiler,
        }
    }

    /// Apply a configuration, keeping previously set knobs that `config`
    /// leaves untouched.
    pub fn configure(&mut self, config: Config) -> &mut Builder<C> {
        self.config = self.config.overwrite(config);
        self
    }

    /// Compile a regex literal into an NFA.
    ///
    /// The pattern may use the `/pattern/flags` form; recognized flag letters
    /// (`i`, `m`, `s`) are translated to option bits for the external
    /// compiler, and the full flag list (including unrecognized letters) is
    /// recorded on the automaton.
    pub fn build(&self, pattern: &str) -> Result<Nfa, BuildError> {
        let (source, options) = Options::split_literal(pattern);
        let code = self
            .compiler
            .compile(source, options.bit_mask())
            .map_err(BuildError::compile)?;
        self.build_from_bytecode(&code, options)
    }

    /// Build an NFA directly from byte-code, skipping the external compiler.
    ///
    /// This is the hand-assembly entry point: byte-code written with
    /// [`Assembler`] goes through the exact same construction as compiler
    /// output.
    pub fn build_from_bytecode(&self, code: &[u8], options: Options) -> Result<Nfa, BuildError> {
        compile::build(code, options, self.config)
    }

    /// Like [`build`](Builder::build), but any failure, whether in the
    /// external compiler or in construction, yields [`Nfa::non_matching`]
    /// instead of an error.
    pub fn build_or_non_matching(&self, pattern: &str) -> Nfa {
        match self.build(pattern) {
            Ok(nfa) => nfa,
            Err(err) => {
                log::warn!("building NFA for {pattern:?} failed, substituting a non-matching automaton: {err}");
                Nfa::non_matching()
            },
        }
    }
}
