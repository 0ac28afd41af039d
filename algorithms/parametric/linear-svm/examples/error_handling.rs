//! Example showing the error conditions of the linear SVM.

use linear_svm::{LinearSvc, SvmError};
use ndarray::array;

fn main() {
    println!("Linear SVM Error Handling Examples");
    println!("==================================");

    let x = array![[1.0, 1.0], [1.5, 0.5], [8.0, 8.0], [8.5, 7.5]];

    // Example 1: Labels must be class indices
    println!("\n1. Fractional class label:");
    let y = array![0.0, 0.5, 1.0, 1.0];
    match LinearSvc::new().fit(x.view(), y.view()) {
        Ok(_) => println!("   Classifier trained"),
        Err(e @ SvmError::NonIntegralLabel { .. }) => println!("   ✓ Caught expected error: {}", e),
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    // Example 2: A single class cannot be separated
    println!("\n2. Only one class:");
    let y = array![1.0, 1.0, 1.0, 1.0];
    match LinearSvc::new().fit(x.view(), y.view()) {
        Ok(_) => println!("   Classifier trained"),
        Err(e @ SvmError::TooFewClasses(_)) => println!("   ✓ Caught expected error: {}", e),
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    // Example 3: Invalid hyperparameter
    println!("\n3. Negative C:");
    let y = array![0.0, 0.0, 1.0, 1.0];
    match LinearSvc::new().with_c(-1.0).fit(x.view(), y.view()) {
        Ok(_) => println!("   Classifier trained"),
        Err(e @ SvmError::InvalidConfig(_)) => println!("   ✓ Caught expected error: {}", e),
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    // Example 4: Successful fit, then a prediction with the wrong width
    println!("\n4. Training and predicting:");
    match LinearSvc::new().fit(x.view(), y.view()) {
        Ok(model) => {
            println!("   ✓ Trained {} binary machine(s)", model.machines().len());
            match model.predict(array![[1.2, 0.9], [7.9, 8.1]].view()) {
                Ok(predicted) => println!("   ✓ Predicted classes: {}", predicted),
                Err(e) => println!("   ✗ Prediction failed: {}", e),
            }
            match model.predict(array![[1.0, 2.0, 3.0]].view()) {
                Ok(_) => println!("   ✗ Prediction should have failed"),
                Err(e) => println!("   ✓ Caught expected error: {}", e),
            }
        }
        Err(e) => println!("   ✗ Failed to train: {}", e),
    }
}
