use std::collections::BTreeMap;

use crate::markets::Market;
use crate::simulator::SimPoints;

/// Expected payoff of each market for each of its teams: the dot product of
/// the team's finishing-position distribution (within the market's subset)
/// and the market's payoff vector.
///
/// Teams outside a market's subset are absent from that market's map, so the
/// renderer can leave their cells blank. Markets must be initialised first.
pub fn calculate_mark_values(
    sim_points: &SimPoints,
    markets: &[Market],
    league: &str,
) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut mark_values = BTreeMap::new();

    for market in markets.iter().filter(|m| m.league == league) {
        let position_probs = sim_points.position_probabilities(Some(market.teams.as_slice()));

        let mut team_marks = BTreeMap::new();
        for team in &market.teams {
            let Some(probs) = position_probs.get(team) else {
                continue;
            };
            let mark: f64 = probs
                .iter()
                .zip(&market.parsed_payoff)
                .map(|(prob, payoff)| prob * payoff)
                .sum();
            team_marks.insert(team.clone(), mark);
        }
        mark_values.insert(market.name.clone(), team_marks);
    }

    mark_values
}
