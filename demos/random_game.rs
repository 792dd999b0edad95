use clap::Parser;
use dilemma::{BimatrixGame, Equilibrium, enumerate_equilibria, lemke_howson};
use ndarray::Array;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Solves a random bimatrix game with every Lemke-Howson label and by
/// support enumeration, and reports whether both methods agree.
#[derive(Parser, Debug)]
struct Args {
    /// Actions of the row player.
    rows: usize,

    /// Actions of the column player.
    cols: usize,

    /// Seed of the payoffs. Without it every run draws a different game.
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let shape = (args.rows, args.cols);
    let game = BimatrixGame::new(
        Array::random_using(shape, Uniform::new(0., 10.), &mut rng),
        Array::random_using(shape, Uniform::new(0., 10.), &mut rng),
    )?;
    println!("Row payoffs:\n{}", game.payoff_matrix(0));
    println!("Column payoffs:\n{}", game.payoff_matrix(1));

    let equilibria = enumerate_equilibria(&game)?;
    println!("{} equilibria by support enumeration", equilibria.len());
    for eq in &equilibria {
        print_equilibrium(&game, eq);
    }

    for label in 0..game.total_strategies() {
        match lemke_howson(&game, label) {
            Ok(eq) if equilibria.contains(&eq) => println!("Label {label}: enumerated"),
            Ok(eq) => {
                println!("Label {label}: not enumerated");
                print_equilibrium(&game, &eq);
            }
            Err(err) => println!("Label {label}: {err}"),
        }
    }
    Ok(())
}

fn print_equilibrium(game: &BimatrixGame, eq: &Equilibrium) {
    let (row_payoff, col_payoff) = game.strategy_payoff(eq);
    println!("  {} | {} -> ({row_payoff:.4}, {col_payoff:.4})", eq.0, eq.1);
}
