//! `SearchDispatch` (§4.8): a single-valued selector between the two search
//! drivers. Switching stops whichever driver is currently running; `load`
//! and `start`/`stop` simply forward to the active one.

use crate::config::SearchConfig;
use crate::info::SearchInfo;
use crate::mcts::MctsSearch;
use crate::position::Position;
use crate::search::AlphaBetaSearch;
use crate::types::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchType {
    AlphaBeta,
    Mcts,
}

pub struct SearchDispatch {
    current: SearchType,
    alpha_beta: AlphaBetaSearch,
    mcts: MctsSearch,
}

impl SearchDispatch {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        SearchDispatch { current: SearchType::AlphaBeta, alpha_beta: AlphaBetaSearch::new(config), mcts: MctsSearch::new(config) }
    }

    #[must_use]
    pub fn current_type(&self) -> SearchType {
        self.current
    }

    /// Stops whichever driver is active, then switches.
    pub fn set_type(&mut self, search_type: SearchType) {
        self.stop();
        self.current = search_type;
    }

    pub fn load(&mut self, position: &Position) {
        match self.current {
            SearchType::AlphaBeta => self.alpha_beta.load(position),
            SearchType::Mcts => self.mcts.load(position),
        }
    }

    pub fn start(
        &mut self,
        max_nodes: u64,
        movetime_ms: Option<u64>,
        bestmove_cb: impl FnMut(Move),
        info_cb: impl FnMut(SearchInfo),
    ) {
        match self.current {
            SearchType::AlphaBeta => self.alpha_beta.start(max_nodes, movetime_ms, bestmove_cb, info_cb),
            SearchType::Mcts => self.mcts.start(max_nodes, movetime_ms, bestmove_cb, info_cb),
        }
    }

    pub fn stop(&self) {
        match self.current {
            SearchType::AlphaBeta => self.alpha_beta.stop(),
            SearchType::Mcts => self.mcts.stop(),
        }
    }
}
