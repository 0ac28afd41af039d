//! Example showing the error conditions of ordinary least squares.

use linear_regression::{LinearRegression, LinearRegressionError};
use ndarray::array;

fn main() {
    println!("Linear Regression Error Handling Examples");
    println!("=========================================");

    // Example 1: Constant columns leave nothing to regress on
    println!("\n1. Constant features:");
    let x = array![[1.0, 4.0], [1.0, 4.0], [1.0, 4.0]];
    let y = array![1.0, 2.0, 3.0];
    match LinearRegression::new().fit(x.view(), y.view()) {
        Ok(model) => println!("   Fitted, coefficients {}", model.coefficients()),
        Err(e @ LinearRegressionError::SingularMatrix) => println!("   ✓ Caught expected error: {}", e),
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    // Example 2: Row and target counts disagree
    println!("\n2. Mismatched targets:");
    let x = array![[1.0], [2.0], [3.0]];
    let y = array![1.0, 2.0];
    match LinearRegression::new().fit(x.view(), y.view()) {
        Ok(_) => println!("   Fitted"),
        Err(e @ LinearRegressionError::Shape(_)) => println!("   ✓ Caught expected error: {}", e),
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    // Example 3: A clean fit and its R²
    println!("\n3. Successful fit:");
    let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0], [3.0, 1.0]];
    let y = array![-2.5, 2.5, 0.5, 3.5];
    match LinearRegression::new().fit(x.view(), y.view()) {
        Ok(model) => {
            println!("   ✓ Coefficients {}, intercept {:.3}", model.coefficients(), model.intercept());
            match model.score(x.view(), y.view()) {
                Ok(r2) => println!("   ✓ R² on the training rows: {:.4}", r2),
                Err(e) => println!("   ✗ Scoring failed: {}", e),
            }
        }
        Err(e) => println!("   ✗ Failed to fit: {}", e),
    }
}
