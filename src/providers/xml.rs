//! Parsers for BoardGameGeek XML API (v1) documents.
//!
//! Both parsers are lenient: a malformed record is skipped with a warning
//! instead of failing the whole document.

use roxmltree::{Document, Node};
use std::collections::{BTreeMap, HashMap};

use crate::core::{Game, GameId, GameStats, SuggestionVotes};
use crate::error::{Result, SuggestError};

/// Player counts with fewer poll votes than this are ignored
pub const MIN_VOTES_FOR_SUGGESTION: u32 = 10;

/// Average ratings backed by fewer voters than this are ignored
pub const MIN_VOTES_FOR_RATING: u32 = 100;

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().skip(1).find(|n| n.has_tag_name(name))
}

fn text_of<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().map(str::trim).unwrap_or_default()
}

/// Positive integer content of a child element, `None` when missing, zero or garbage
fn positive_child(node: Node<'_, '_>, name: &str) -> Option<u32> {
    child(node, name)
        .and_then(|n| text_of(n).parse::<u32>().ok())
        .filter(|v| *v > 0)
}

/// Parse a `/xmlapi/collection/<username>` document
pub fn parse_collection(xml: &str) -> Result<HashMap<GameId, GameStats>> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    let errors_node = if root.has_tag_name("errors") {
        Some(root)
    } else {
        descendant(root, "errors")
    };

    if let Some(errors) = errors_node {
        let messages: Vec<&str> = errors
            .descendants()
            .filter(|n| n.has_tag_name("message"))
            .map(text_of)
            .collect();
        return Err(SuggestError::Provider {
            provider: "bgg".to_string(),
            message: messages.join("; "),
        });
    }

    let mut games = HashMap::new();

    for item in root.descendants().filter(|n| n.has_tag_name("item")) {
        let Some(game_id) = item.attribute("objectid").and_then(|id| id.parse::<GameId>().ok()) else {
            tracing::warn!("Missing objectid");
            continue;
        };

        let mut stats = GameStats::new(game_id);

        let Some(numplays) = child(item, "numplays") else {
            tracing::warn!("Missing numplays for game with id {}", game_id);
            continue;
        };
        stats.play_count = text_of(numplays).parse().unwrap_or(0);

        let Some(status) = child(item, "status") else {
            tracing::warn!("Missing status for game with id {}", game_id);
            continue;
        };
        stats.owned = status.attribute("own") == Some("1");
        stats.want_to_play = status.attribute("wanttoplay") == Some("1");

        stats.rating = child(item, "stats")
            .and_then(|s| child(s, "rating"))
            .and_then(|r| r.attribute("value"))
            .filter(|v| *v != "N/A")
            .and_then(|v| match v.parse::<f64>() {
                Ok(rating) => Some(rating / 10.0),
                Err(_) => {
                    tracing::warn!("Invalid rating '{}' for game with id {}", v, game_id);
                    None
                }
            });

        games.insert(game_id, stats);
    }

    Ok(games)
}

/// Parse the `suggested_numplayers` poll of a game whose maximum player count is known
fn parse_suggested_players(poll: Node<'_, '_>, player_max: u32) -> Option<BTreeMap<u32, SuggestionVotes>> {
    let mut suggested: BTreeMap<u32, SuggestionVotes> = BTreeMap::new();

    for results in poll.children().filter(|n| n.has_tag_name("results")) {
        let Some(numplayers) = results.attribute("numplayers") else {
            continue;
        };

        let player_nums: Vec<u32> = if let Some(more_than) = numplayers.strip_suffix('+') {
            let Ok(more_than) = more_than.trim().parse::<u32>() else {
                tracing::warn!("Cannot convert numplayers '{}' to int", numplayers);
                continue;
            };
            let Some(first) = more_than.checked_add(1) else {
                tracing::warn!("Player count out of range in numplayers '{}'", numplayers);
                continue;
            };
            (first..=player_max).collect()
        } else {
            match numplayers.trim().parse::<u32>() {
                Ok(n) => vec![n],
                Err(_) => {
                    tracing::warn!("Cannot convert numplayers '{}' to int", numplayers);
                    continue;
                }
            }
        };

        for option in results.children().filter(|n| n.has_tag_name("result")) {
            let (Some(value), Some(numvotes)) = (option.attribute("value"), option.attribute("numvotes")) else {
                continue;
            };
            let Ok(votes) = numvotes.parse::<u32>() else {
                tracing::warn!("Cannot convert numvotes '{}' to int", numvotes);
                continue;
            };

            for pn in &player_nums {
                suggested.entry(*pn).or_default().add(value, votes);
            }
        }
    }

    suggested.retain(|_, votes| votes.total() >= MIN_VOTES_FOR_SUGGESTION);

    if suggested.is_empty() {
        None
    } else {
        Some(suggested)
    }
}

fn parse_boardgame(node: Node<'_, '_>) -> Option<Game> {
    let Some(game_id) = node.attribute("objectid").and_then(|id| id.parse::<GameId>().ok()) else {
        tracing::warn!("A game does not have an id");
        return None;
    };

    let Some(name) = node
        .children()
        .filter(|n| n.has_tag_name("name"))
        .find(|n| n.attribute("primary") == Some("true"))
        .map(text_of)
    else {
        tracing::warn!("A game [{}] does not have a name", game_id);
        return None;
    };

    let mut game = Game::new(game_id, name);

    game.player_min = positive_child(node, "minplayers");
    game.player_max = positive_child(node, "maxplayers");
    game.playing_time = positive_child(node, "playingtime");

    game.expansion_of = node
        .children()
        .filter(|n| n.has_tag_name("boardgameexpansion"))
        .filter(|n| n.attribute("inbound") == Some("true"))
        .filter_map(|n| n.attribute("objectid").and_then(|id| id.parse::<GameId>().ok()))
        .collect();

    if let Some(player_max) = game.player_max {
        game.suggested_players = node
            .children()
            .filter(|n| n.has_tag_name("poll"))
            .find(|n| n.attribute("name") == Some("suggested_numplayers"))
            .and_then(|poll| parse_suggested_players(poll, player_max));
    }

    if let Some(ratings) = child(node, "statistics").and_then(|s| child(s, "ratings")) {
        game.average_weight = child(ratings, "averageweight")
            .and_then(|n| text_of(n).parse::<f64>().ok())
            .filter(|w| *w > 0.0);

        let users_rated = child(ratings, "usersrated").and_then(|n| text_of(n).parse::<u32>().ok());
        let average = child(ratings, "average").and_then(|n| text_of(n).parse::<f64>().ok());
        match (users_rated, average) {
            (Some(votes), Some(average)) if votes >= MIN_VOTES_FOR_RATING => {
                game.average_rating = Some(average / 10.0);
            }
            (None, _) | (_, None) => {
                tracing::debug!("Game [{}] has no usable average rating", game_id);
            }
            _ => {}
        }
    }

    Some(game)
}

/// Parse a `/xmlapi/boardgame/<ids>?stats=1` document
pub fn parse_games(xml: &str) -> Result<HashMap<GameId, Game>> {
    let doc = Document::parse(xml)?;

    Ok(doc
        .root_element()
        .descendants()
        .filter(|n| n.has_tag_name("boardgame"))
        .filter_map(parse_boardgame)
        .map(|game| (game.game_id, game))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION_XML: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<items totalitems="4" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse" pubdate="Fri, 16 Oct 2026 10:00:00 +0000">
  <item objecttype="thing" objectid="13" subtype="boardgame" collid="1">
    <name sortindex="1">Catan</name>
    <stats minplayers="3" maxplayers="4" playingtime="120">
      <rating value="7.5"><usersrated value="100"/></rating>
    </stats>
    <status own="1" prevowned="0" fortrade="0" want="0" wanttoplay="0" wanttobuy="0" wishlist="0" preordered="0"/>
    <numplays>12</numplays>
  </item>
  <item objecttype="thing" objectid="822" subtype="boardgame" collid="2">
    <name sortindex="1">Carcassonne</name>
    <stats minplayers="2" maxplayers="5" playingtime="45">
      <rating value="N/A"/>
    </stats>
    <status own="0" wanttoplay="1"/>
    <numplays>0</numplays>
  </item>
  <item objecttype="thing" objectid="30549" subtype="boardgame" collid="3">
    <name sortindex="1">Pandemic</name>
    <status own="1"/>
  </item>
  <item objecttype="thing" subtype="boardgame" collid="4">
    <name sortindex="1">No id</name>
    <status own="1"/>
    <numplays>1</numplays>
  </item>
</items>"#;

    const GAMES_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<boardgames termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
  <boardgame objectid="13">
    <yearpublished>1995</yearpublished>
    <minplayers>3</minplayers>
    <maxplayers>4</maxplayers>
    <playingtime>120</playingtime>
    <name sortindex="1">Die Siedler von Catan</name>
    <name primary="true" sortindex="1">Catan</name>
    <boardgameexpansion objectid="926">Catan: 5-6 Player Extension</boardgameexpansion>
    <poll title="User Suggested Number of Players" totalvotes="120" name="suggested_numplayers">
      <results numplayers="1">
        <result value="Best" numvotes="0"/>
        <result value="Recommended" numvotes="1"/>
        <result value="Not Recommended" numvotes="3"/>
      </results>
      <results numplayers="3">
        <result value="Best" numvotes="20"/>
        <result value="Recommended" numvotes="30"/>
        <result value="Not Recommended" numvotes="5"/>
      </results>
      <results numplayers="4">
        <result value="Best" numvotes="60"/>
        <result value="Recommended" numvotes="10"/>
        <result value="Not Recommended" numvotes="2"/>
      </results>
      <results numplayers="4+">
        <result value="Best" numvotes="1"/>
        <result value="Recommended" numvotes="1"/>
        <result value="Not Recommended" numvotes="50"/>
      </results>
    </poll>
    <statistics page="1">
      <ratings>
        <usersrated>95000</usersrated>
        <average>7.12</average>
        <bayesaverage>6.98</bayesaverage>
        <averageweight>2.31</averageweight>
      </ratings>
    </statistics>
  </boardgame>
  <boardgame objectid="926">
    <minplayers>5</minplayers>
    <maxplayers>6</maxplayers>
    <playingtime>0</playingtime>
    <name primary="true" sortindex="1">Catan: 5-6 Player Extension</name>
    <boardgameexpansion objectid="13" inbound="true">Catan</boardgameexpansion>
    <poll title="User Suggested Number of Players" totalvotes="5" name="suggested_numplayers">
      <results numplayers="5">
        <result value="Best" numvotes="3"/>
        <result value="Recommended" numvotes="2"/>
      </results>
      <results numplayers="6+">
        <result value="Best" numvotes="4"/>
      </results>
    </poll>
    <statistics page="1">
      <ratings>
        <usersrated>42</usersrated>
        <average>6.9</average>
        <averageweight>0</averageweight>
      </ratings>
    </statistics>
  </boardgame>
  <boardgame objectid="99">
    <name sortindex="1">Only alternate name</name>
  </boardgame>
</boardgames>"#;

    #[test]
    fn test_parse_collection() {
        let games = parse_collection(COLLECTION_XML).unwrap();

        assert_eq!(games.len(), 2);

        let catan = &games[&13];
        assert!(catan.owned);
        assert!(!catan.want_to_play);
        assert_eq!(catan.play_count, 12);
        assert_eq!(catan.rating, Some(0.75));

        let carcassonne = &games[&822];
        assert!(!carcassonne.owned);
        assert!(carcassonne.want_to_play);
        assert_eq!(carcassonne.rating, None);
    }

    #[test]
    fn test_parse_collection_skips_incomplete_items() {
        let games = parse_collection(COLLECTION_XML).unwrap();
        // Pandemic has no numplays, the last item no objectid
        assert!(!games.contains_key(&30549));
    }

    #[test]
    fn test_parse_collection_errors() {
        let xml = r#"<errors><error><message>Invalid username specified</message></error></errors>"#;
        let err = parse_collection(xml).unwrap_err();
        assert!(err.to_string().contains("Invalid username specified"));
    }

    #[test]
    fn test_parse_collection_malformed() {
        assert!(matches!(parse_collection("<items><item>"), Err(SuggestError::Xml(_))));
    }

    #[test]
    fn test_parse_games() {
        let games = parse_games(GAMES_XML).unwrap();
        assert_eq!(games.len(), 2);

        let catan = &games[&13];
        assert_eq!(catan.name, "Catan");
        assert_eq!(catan.player_min, Some(3));
        assert_eq!(catan.player_max, Some(4));
        assert_eq!(catan.playing_time, Some(120));
        assert!(!catan.is_expansion());
        assert_eq!(catan.average_weight, Some(2.31));
        assert!((catan.average_rating.unwrap() - 0.712).abs() < 1e-9);
    }

    #[test]
    fn test_parse_games_suggested_players() {
        let games = parse_games(GAMES_XML).unwrap();
        let suggested = games[&13].suggested_players.as_ref().unwrap();

        // "1" has too few votes, "4+" lies beyond the maximum
        assert_eq!(suggested.keys().copied().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(
            suggested[&4],
            SuggestionVotes {
                best: 60,
                recommended: 10,
                not_recommended: 2
            }
        );
    }

    #[test]
    fn test_parse_games_expansion() {
        let games = parse_games(GAMES_XML).unwrap();
        let extension = &games[&926];

        assert!(extension.is_expansion());
        assert!(extension.expansion_of.contains(&13));
        assert_eq!(extension.playing_time, None);
        assert_eq!(extension.average_weight, None);
        // too few voters
        assert_eq!(extension.average_rating, None);
        // "5" has too few votes, "6+" lies beyond the maximum
        assert_eq!(extension.suggested_players, None);
    }

    #[test]
    fn test_plus_results_spread_over_range() {
        let xml = r#"<boardgames><boardgame objectid="1">
            <minplayers>1</minplayers><maxplayers>4</maxplayers>
            <name primary="true">Spread</name>
            <poll name="suggested_numplayers">
              <results numplayers="2+">
                <result value="Best" numvotes="8"/>
                <result value="Recommended" numvotes="4"/>
              </results>
            </poll>
        </boardgame></boardgames>"#;

        let games = parse_games(xml).unwrap();
        let suggested = games[&1].suggested_players.as_ref().unwrap();
        assert_eq!(suggested.keys().copied().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(suggested[&3].best, 8);
        assert_eq!(suggested[&4].recommended, 4);
    }

    #[test]
    fn test_out_of_range_plus_result_is_skipped() {
        let xml = r#"<boardgames><boardgame objectid="1">
            <minplayers>1</minplayers><maxplayers>4</maxplayers>
            <name primary="true">Broken poll</name>
            <poll name="suggested_numplayers">
              <results numplayers="4294967295+">
                <result value="Best" numvotes="50"/>
              </results>
              <results numplayers="2">
                <result value="Best" numvotes="12"/>
              </results>
            </poll>
        </boardgame></boardgames>"#;

        let games = parse_games(xml).unwrap();
        let suggested = games[&1].suggested_players.as_ref().unwrap();
        assert_eq!(suggested.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_huge_vote_counts_saturate() {
        let xml = r#"<boardgames><boardgame objectid="1">
            <minplayers>1</minplayers><maxplayers>4</maxplayers>
            <name primary="true">Popular</name>
            <poll name="suggested_numplayers">
              <results numplayers="3">
                <result value="Best" numvotes="4294967295"/>
                <result value="Recommended" numvotes="7"/>
              </results>
              <results numplayers="2+">
                <result value="Best" numvotes="1"/>
              </results>
            </poll>
        </boardgame></boardgames>"#;

        let games = parse_games(xml).unwrap();
        let votes = &games[&1].suggested_players.as_ref().unwrap()[&3];
        assert_eq!(votes.best, u32::MAX);
        assert_eq!(votes.recommended, 7);
        assert_eq!(votes.total(), u32::MAX);
    }
}
