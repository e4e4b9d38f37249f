//! Folding expansions under the base games they require.
//!
//! Expansions and the bases they extend form a directed graph
//! (`base -> expansion`, possibly chained). A base is proposed with every
//! path of expansions that lets the whole group play.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::{ExpansionSuggestion, Game, GameId, Suggestion};
use crate::ranking::{by_score_desc, RankedGame};

/// Directed graph of playable expansions and the available games they extend
#[derive(Debug, Default)]
pub struct ExpansionGraph {
    nodes: BTreeSet<GameId>,
    edges: BTreeMap<GameId, BTreeSet<GameId>>,
}

impl ExpansionGraph {
    /// Link every playable expansion to each of its bases found in `available`
    pub fn build(playable: &[RankedGame], available: &HashMap<GameId, Game>) -> Self {
        let mut graph = Self::default();

        for ranked in playable.iter().filter(|r| r.game.is_expansion()) {
            let expansion = ranked.game.game_id;
            graph.nodes.insert(expansion);

            for base in ranked.game.expansion_of.iter().filter(|b| available.contains_key(b)) {
                graph.nodes.insert(*base);
                graph.edges.entry(*base).or_default().insert(expansion);
            }
        }

        graph
    }

    pub fn nodes(&self) -> impl Iterator<Item = GameId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.nodes.contains(&id)
    }

    /// Every simple path starting at `start` and ending at another node
    pub fn simple_paths_from(&self, start: GameId) -> Vec<Vec<GameId>> {
        let mut paths = Vec::new();
        let mut path = vec![start];
        self.walk(&mut path, &mut paths);
        paths
    }

    fn walk(&self, path: &mut Vec<GameId>, paths: &mut Vec<Vec<GameId>>) {
        let Some(last) = path.last().copied() else {
            return;
        };
        let Some(next) = self.edges.get(&last) else {
            return;
        };

        for node in next {
            if path.contains(node) {
                continue;
            }
            path.push(*node);
            paths.push(path.clone());
            self.walk(path, paths);
            path.pop();
        }
    }
}

/// Whether the group fits the combined player range of a base and its expansions
fn path_supports_players(path: &[GameId], available: &HashMap<GameId, Game>, players: usize) -> bool {
    let games = path.iter().filter_map(|id| available.get(id));

    let p_max = games.clone().filter_map(|g| g.player_max).max();
    let p_min = games.filter_map(|g| g.player_min).max();

    match (p_min, p_max) {
        (Some(min), Some(max)) => (min as usize..=max as usize).contains(&players),
        _ => false,
    }
}

fn sort_suggestions(suggestions: &mut [Suggestion]) {
    suggestions.sort_by(|a, b| by_score_desc((a.rank_score, &a.game), (b.rank_score, &b.game)));
}

/// Every playable game as its own entry
pub fn list_separately(ranked: Vec<RankedGame>) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = ranked
        .into_iter()
        .map(|r| Suggestion::new(r.game, r.score, r.evaluation))
        .collect();

    sort_suggestions(&mut suggestions);
    suggestions
}

/// Fold expansions into their base games.
///
/// * `ranked` — every game playable by the group (scored)
/// * `available` — every game owned by the collection group
///
/// A base takes the best score among itself and its usable expansions. A base
/// that the group can only play with an expansion is kept with `score: None`.
/// Expansions no longer appear as top-level entries.
pub fn group_expansions(
    ranked: Vec<RankedGame>,
    available: &HashMap<GameId, Game>,
    players: usize,
) -> Vec<Suggestion> {
    let graph = ExpansionGraph::build(&ranked, available);
    let scored: HashMap<GameId, RankedGame> = ranked.into_iter().map(|r| (r.game.game_id, r)).collect();

    let mut suggestions = Vec::new();

    // Games untouched by expansions
    for ranked in scored.values().filter(|r| !graph.contains(r.game.game_id)) {
        suggestions.push(Suggestion::new(ranked.game.clone(), ranked.score, ranked.evaluation.clone()));
    }

    for base_id in graph.nodes() {
        let Some(base) = available.get(&base_id) else {
            continue;
        };
        if base.is_expansion() {
            continue;
        }

        let usable: BTreeSet<GameId> = graph
            .simple_paths_from(base_id)
            .into_iter()
            .filter(|path| path_supports_players(path, available, players))
            .flatten()
            .filter(|id| *id != base_id)
            .collect();

        let own = scored.get(&base_id);

        if usable.is_empty() {
            // No expansion fits: the base stands alone, if it can
            if let Some(own) = own {
                suggestions.push(Suggestion::new(own.game.clone(), own.score, own.evaluation.clone()));
            }
            continue;
        }

        let mut expansions: Vec<ExpansionSuggestion> = usable
            .iter()
            .filter_map(|id| {
                let ranked = scored.get(id);
                let game = ranked.map(|r| &r.game).or_else(|| available.get(id))?;
                Some(ExpansionSuggestion {
                    game: game.clone(),
                    score: ranked.map(|r| r.score),
                    evaluation: ranked.map(|r| r.evaluation.clone()),
                })
            })
            .collect();
        expansions.sort_by(|a, b| {
            by_score_desc((a.score.unwrap_or(0.0), &a.game), (b.score.unwrap_or(0.0), &b.game))
        });

        let rank_score = expansions
            .iter()
            .filter_map(|e| e.score)
            .fold(own.map_or(0.0, |o| o.score), f64::max);

        suggestions.push(Suggestion {
            game: base.clone(),
            rank_score,
            score: own.map(|o| o.score),
            evaluation: own.map(|o| o.evaluation.clone()),
            expansions,
        });
    }

    sort_suggestions(&mut suggestions);
    suggestions
}
